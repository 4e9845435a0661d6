pub mod locks;
pub mod matching;
pub mod pipeline;
pub mod retry;
pub mod scheduling;
