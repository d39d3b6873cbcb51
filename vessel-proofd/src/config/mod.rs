mod app;
pub use app::App;

mod exchange;
pub use exchange::Exchange;

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
