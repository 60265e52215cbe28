use std::{panic::PanicHookInfo, sync::Once};

use eyre::WrapErr;
use tracing_subscriber::{
    filter::FilterFn, fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt,
};

#[cfg(target_os = "android")]
const LOGCAT_TAG: &str = "Amply-Rust";

/// Routes `tracing` output to logcat (stderr off Android). Safe to call
/// more than once.
#[uniffi::export]
pub fn setup_logging() {
    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(|| {
        if let Err(err) = install_subscriber() {
            eprintln!("amply: logging disabled: {err:?}");
        }
        std::panic::set_hook(Box::new(panic_hook));
    })
}

fn amply_only() -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool> {
    FilterFn::new(|meta| meta.module_path().unwrap_or_default().starts_with("amply"))
}

#[cfg(target_os = "android")]
fn install_subscriber() -> eyre::Result<()> {
    use tracing_logcat::{LogcatMakeWriter, LogcatTag};

    let tag = LogcatTag::Fixed(LOGCAT_TAG.to_owned());
    let writer = LogcatMakeWriter::new(tag).wrap_err("failed to initialize logcat writer")?;
    let layer = tracing_subscriber::fmt::layer()
        .event_format(Format::default().with_level(false).without_time())
        .with_writer(writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(amply_only())
        .try_init()
        .wrap_err("a global subscriber is already set")
}

#[cfg(not(target_os = "android"))]
fn install_subscriber() -> eyre::Result<()> {
    let layer = tracing_subscriber::fmt::layer()
        .event_format(Format::default().without_time())
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(layer)
        .with(amply_only())
        .try_init()
        .wrap_err("a global subscriber is already set")
}

fn panic_hook(info: &PanicHookInfo) {
    tracing::error!("{info}")
}
