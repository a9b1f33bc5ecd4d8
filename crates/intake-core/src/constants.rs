/// Media type used when nothing can be inferred from the file name.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Name of the synthetic file shown in every directory listing.
pub const PLACEHOLDER_FILE_NAME: &str = "readme.txt";

/// Contents written to the placeholder when it is first created.
pub const PLACEHOLDER_TEXT: &str = "Welcome to the FTP Upload Service\n\
You can upload files to this directory.\n\
Files will be automatically processed after upload.\n";

/// Login names treated as anonymous (no authenticated identity).
pub const ANONYMOUS_USERNAMES: &[&str] = &["anonymous", "ftp"];

/// Reply sent to a client whose upload was refused by the rate limiter.
pub const RATE_LIMIT_REPLY_CODE: u16 = 550;
pub const RATE_LIMIT_REPLY_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Statuses the storage service may answer a direct upload with.
pub const TRANSFER_SUCCESS_STATUSES: &[u16] = &[200, 201, 204];

/// Multipart field carrying the file bytes in a direct upload.
pub const TRANSFER_FILE_FIELD: &str = "file";

/// Maximum number of characters of an upstream error body kept in logs.
pub const MAX_LOGGED_BODY_CHARS: usize = 512;
