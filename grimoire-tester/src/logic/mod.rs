pub mod assets;
pub mod checks;
pub mod generator;
pub mod reports;
pub mod tester;

pub use assets::{AssetPaths, FileLoader, TesterAssets};
pub use tester::*;
