/// Suffix of the quality-flag column paired with each measurement column
pub const QUALITY_SUFFIX: &str = " Quality";

/// Default source file, as exported by the station pipeline
pub const DEFAULT_DATA_FILE: &str = "new_df.parquet";

/// Configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "nwfp-met.toml";
pub const ENV_PREFIX: &str = "NWFP_MET";

/// Distribution defaults
pub const DEFAULT_HISTOGRAM_BINS: usize = 40;
pub const DEFAULT_ROSE_BINS: usize = 35;
pub const DEFAULT_KDE_POINTS: usize = 200;

/// Compass labels for rose and polar axes, clockwise from north
pub const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Processing defaults
pub const DEFAULT_BATCH_SIZE: usize = 8192;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
