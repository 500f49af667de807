//! wasm 运行时的初始化工具。

pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// 将 `log` 输出接到浏览器控制台；重复初始化时静默忽略。
pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Info);
    }
}
