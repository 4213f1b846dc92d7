//! Solidity interfaces for contract interaction

alloy::sol! {
    /// PokerHand NFT: ERC-721 with a payable mint and on-chain metadata.
    #[sol(rpc)]
    interface IPokerHand {
        error ERC721NonexistentToken(uint256 tokenId);

        function mint() external payable;
        function ownerOf(uint256 tokenId) external view returns (address);
        function balanceOf(address owner) external view returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string memory);
    }

    /// Initializer of the upgradeable BondCake implementation.
    #[sol(rpc)]
    interface IBondCake {
        function initialize(address cake, address cakePool) external;
    }

    #[sol(rpc)]
    interface IUUPSUpgradeable {
        function upgradeToAndCall(address newImplementation, bytes memory data) external payable;
    }
}
