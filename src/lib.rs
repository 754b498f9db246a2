// ibex_trapcore/src/lib.rs

#![cfg_attr(not(test), no_std)]

// 声明内核模块
pub mod config;
pub mod console;
pub mod test;
pub mod trap;

/// Panic处理器 - 屏蔽中断、输出信息后停机
#[cfg(all(target_arch = "riscv32", target_os = "none", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    trap::infrastructure::low_level::disable_interrupts();

    error_print!("KERNEL PANIC!");
    error_print!("  {}", info);
    if trap::irq_is_in() {
        error_print!("  Raised while servicing a trap.");
    }

    error_print!("System halted.");
    trap::infrastructure::low_level::halt()
}

/// 系统初始化
///
/// 由板级启动代码在关中断状态下调用一次。控制台写函数应当已经通过
/// `console::set_writer` 注册，否则日志被丢弃。
pub fn init(
    components: trap::TrapComponents<'static>,
    trap_stack_top: u32,
) -> Result<(), trap::TrapApiError> {
    info_print!("Ibex trap core initializing...");
    info_print!("  Core clock: {} Hz, frame size: {} bytes", config::CLOCK_CORECLOCK, trap::CONTEXT_FRAME_SIZE);

    trap::init(components, trap_stack_top)?;

    info_print!("System Core Initialization Completed.");
    Ok(())
}
