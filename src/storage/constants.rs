// Buffer related constants
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

// Transfer defaults
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MINIO_ENDPOINT: &str = "http://localhost:9000";

// Suffix of the temporary file a download streams into before the rename
pub const PARTIAL_FILE_SUFFIX: &str = ".spacesync-part";

// Filesystem default
pub const DEFAULT_FS_ROOT: &str = "./storage";
