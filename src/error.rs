use thiserror::Error;

/// Errors that can occur while building an image pyramid
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// Source image has zero width or height
    #[error("Source image is empty: width and height must both be greater than 0")]
    EmptySource,

    /// Source exceeds the bitmap limits this builder is allowed to allocate
    #[error("Source image {width}x{height} is too large to build in-process: {reason}")]
    ResourceExhausted {
        width: u32,
        height: u32,
        reason: String,
    },

    /// Source file could not be opened or decoded
    #[error("Failed to decode source image: {message}")]
    Decode { message: String },

    /// A tile could not be encoded
    #[error("Failed to encode tile: {message}")]
    Encode { message: String },

    /// The build was cancelled by its caller
    #[error("Pyramid build was cancelled")]
    Cancelled,

    /// The background build task ended without producing a result
    #[error("Pyramid build worker failed: {message}")]
    Worker { message: String },
}

/// Errors returned by tile stores
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Key is inside the grid but the store has no bytes for it
    #[error("Tile not found: level {level}, row {row}, col {col}")]
    TileNotFound { level: usize, row: u32, col: u32 },

    /// Key lies outside the pyramid's level range or tile grid
    #[error("Tile out of bounds: level {level}, row {row}, col {col}")]
    TileOutOfBounds { level: usize, row: u32, col: u32 },

    /// Persisted tile set manifest is missing, unparseable or inconsistent
    #[error("Invalid tile set manifest: {message}")]
    InvalidManifest { message: String },

    /// Filesystem error while reading or writing a tile set
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },
}

/// Errors that can occur when fetching a tile for display
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The tile store could not produce the tile
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Tile bytes are not a decodable image
    #[error("Failed to decode tile: {message}")]
    Decode { message: String },

    /// Tile decoded but is not TILE_SIZE x TILE_SIZE
    #[error("Tile has dimensions {width}x{height}, expected {expected}x{expected}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        expected: u32,
    },
}
