pub mod use_cases;

pub use use_cases::export::ExportUseCase;
pub use use_cases::inspect::InspectUseCase;
pub use use_cases::workbench::WorkbenchUseCase;
