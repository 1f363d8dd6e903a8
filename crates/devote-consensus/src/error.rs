use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Returned for operations that never apply to the genesis block, or
    /// when a block is not part of the local chain.
    #[error("unknown block")]
    UnknownBlock,

    #[error("block in the future")]
    FutureBlock,

    #[error("extra-data 32 byte vanity prefix missing")]
    MissingVanity,

    #[error("extra-data 65 byte suffix signature missing")]
    MissingSignature,

    #[error("non-zero mix digest")]
    InvalidMixDigest,

    #[error("invalid difficulty")]
    InvalidDifficulty,

    #[error("non empty uncle hash")]
    InvalidUncleHash,

    #[error("unknown ancestor")]
    UnknownAncestor,

    /// Timestamp lower than the parent's timestamp plus one slot width
    #[error("invalid timestamp")]
    InvalidTimestamp,

    #[error("wait for last block to arrive")]
    WaitForPrevBlock,

    #[error("mint the future block")]
    MintFutureBlock,

    /// Recovered signer does not match the scheduled witness
    #[error("invalid block witness")]
    InvalidBlockWitness,

    /// Recovered signer does not match the header's declared witness
    #[error("mismatch block signer and witness")]
    MismatchSignerAndWitness,

    #[error("nil block header returned")]
    NilHeader,

    #[error("signer not authorized")]
    SignerNotAuthorized,

    /// Chain-specific fork activation rule violated
    #[error("fork rules violated: {0}")]
    ForkRules(String),

    /// Failure reported by the epoch/validator-set context collaborator
    #[error("context error: {0}")]
    Context(String),

    #[error("Core error: {0}")]
    Core(#[from] devote_core::CoreError),

    #[error("State error: {0}")]
    State(#[from] devote_state::StateError),
}
