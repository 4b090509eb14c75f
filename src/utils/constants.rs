use alloy::primitives::{address, Address, U256};

/// Standard WAD (10^18)
pub const WAD_U256: U256 = U256::from_limbs([1000000000000000000, 0, 0, 0]);

/// Pseudo-token address standing in for the native asset.
pub const ETH_ADDR: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Deployer of the sandbox's registry contracts; CREATE addresses derive from its nonce.
pub const REGISTRY_DEPLOYER: Address = address!("5a15566417e6C1c9546523066500bDDBc53F88C7");

/// Factory used for proxy addresses.
pub const PROXY_FACTORY: Address = address!("A26e15C895EFc0616177B7c1e7270A4C7D51C997");

/// Param mapping values at or above this index address sub-data slots, which the sandbox does not model.
pub const SUB_DATA_INDEX_START: u8 = 128;

/// Default signer accounts (the well-known dev-node mnemonic).
pub const DEV_SIGNERS: [Address; 10] = [
    address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
    address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
    address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
    address!("90F79bf6EB2c4f870365E785982E1f101E93b906"),
    address!("15d34AAf54267DB7D7c367839AAf71A00a2C6A65"),
    address!("9965507D1a55bcC2695C58ba16FB37d819B0A4dc"),
    address!("976EA74026E726554dB657fA54763abd0C3a0aa9"),
    address!("14dC79964da2C08b23698B3D3cc7Ca32193d9955"),
    address!("23618e81E3f5cdF7f54C3d65f7FBc0aBf5B21E8f"),
    address!("a0Ee7A142d267C1f36714E4a8F75612F20a79720"),
];

/// `amount` whole tokens at 18 decimals.
pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * WAD_U256
}
