//! 线索轮询分配服务的进程装配：应用组装与优雅关闭

pub mod app;
pub mod shutdown;

pub use app::Application;
pub use shutdown::ShutdownManager;
