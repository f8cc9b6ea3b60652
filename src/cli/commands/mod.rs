//! One module per subcommand, each exposing `execute`.

pub mod add;
pub mod audit_cmd;
pub mod completions;
pub mod copy;
pub mod delete;
pub mod edit;
pub mod generate;
pub mod init;
pub mod list;
pub mod passwd;
pub mod show;
pub mod version;
