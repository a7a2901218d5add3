pub mod legacy_sheet;
pub mod pipeline;

pub use legacy_sheet::LegacySheetClient;
pub use pipeline::PipelineClient;
