pub mod controller;
pub mod handlers;
pub mod machine;
pub mod suggestions;
