#[allow(deprecated)] // `PanicHookInfo` is only available in Rust 1.81+.
use std::panic::{self, PanicInfo};

use crate::collector::Collector;
use crate::report::{Frame, Report};

/// Sends every panic to `collector` as an uncaught report, then runs the
/// previously installed hook.
///
/// Collectors drop these reports while `capture_uncaught` is off. Each call
/// chains another hook, so install once per process.
pub fn install_panic_hook<C: Collector + 'static>(collector: C) {
    let next = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        collector.error(report_from_panic(info));
        next(info);
    }));
}

#[allow(deprecated)]
fn report_from_panic(info: &PanicInfo<'_>) -> Report {
    let location = info
        .location()
        .map(|l| Frame::new(l.file(), l.line(), l.column()));
    Report::uncaught(message_from_panic(info), location)
}

#[allow(deprecated)]
fn message_from_panic<'a>(info: &'a PanicInfo<'_>) -> &'a str {
    match info.payload().downcast_ref::<&'static str>() {
        Some(s) => s,
        None => match info.payload().downcast_ref::<String>() {
            Some(s) => &s[..],
            None => "Box<Any>",
        },
    }
}
