pub mod ledger_store;
pub mod render_dispatcher;
pub mod sheet_assembler;
pub mod template;

pub use ledger_store::LedgerStore;
pub use render_dispatcher::{Dispatched, RenderDispatcher};
pub use sheet_assembler::{SheetAssembler, SheetOutcome};
pub use template::{SvgTemplate, TemplateRenderer};
