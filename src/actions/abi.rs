//! Solidity ABI of the action and recipe entry points.
//!
//! Payloads built from these types are byte-compatible with the deployed contracts, so a
//! recipe encoded here can be replayed against a live proxy unchanged.

alloy::sol! {
    struct RecipeData {
        string name;
        bytes[] callData;
        bytes32[] subData;
        bytes4[] actionIds;
        uint8[][] paramMapping;
    }

    interface IRecipeExecutor {
        function executeRecipe(RecipeData memory _currRecipe) external payable;
    }

    interface IActionBase {
        function executeActionDirect(bytes memory _callData) external payable;
    }

    interface IDSProxy {
        function execute(address _target, bytes memory _data) external payable returns (bytes32 response);
        function owner() external view returns (address);
    }

    struct WrapEthParams {
        uint256 amount;
    }

    struct UnwrapEthParams {
        uint256 amount;
        address to;
    }

    struct SendTokenParams {
        address tokenAddr;
        address to;
        uint256 amount;
    }

    struct PullTokenParams {
        address tokenAddr;
        address from;
        uint256 amount;
    }

    struct SumInputsParams {
        uint256 a;
        uint256 b;
    }

    struct SubInputsParams {
        uint256 a;
        uint256 b;
    }

    struct ChangeProxyOwnerParams {
        address newOwner;
    }

    struct AutomationV2UnsubParams {
        uint256 cdpId;
        uint8 protocol;
    }
}
