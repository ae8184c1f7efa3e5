//! Config - 통합 설정 관리
//!
//! - `lineage.rs` - LineageConfig 통합 설정 (registry / context / logging)

mod lineage;

pub use lineage::{
    ContextConfig, LineageConfig, LoggingConfig, RegistryConfig, LINEAGE_CONFIG_DIR,
    LINEAGE_CONFIG_FILE,
};
