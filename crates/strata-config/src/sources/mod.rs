//! Concrete configuration sources.
//!
//! | Source | Priority | Keys |
//! |---|---|---|
//! | [`SystemPropertySource`] | 1000 | prefix stripped, case kept |
//! | [`EnvironmentVariableSource`] | 900 | prefix stripped, lowercased |
//! | [`YamlSource`] | 500 unless overridden | document structure |
//! | [`PropertiesSource`] | 400 unless overridden | flat keys |

mod classpath;
mod environment_variable;
mod file;
mod properties;
mod system_property;
mod yaml;

pub use classpath::{Classpath, CLASSPATH_ENV};
pub use environment_variable::EnvironmentVariableSource;
pub use file::{FileFormat, FileSource, Origin};
pub use properties::{Properties, PropertiesSource};
pub use system_property::SystemPropertySource;
pub use yaml::{Yaml, YamlSource};
