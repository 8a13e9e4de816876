use chrono::Local;
use fern::Dispatch;
use log::LevelFilter;

pub(crate) fn setup_logging(log_level: LevelFilter) -> anyhow::Result<()> {
    Dispatch::new()
        .format(move |out, msg, record| {
            out.finish(format_args!(
                "[{}] {: >5} [{}] {}",
                Local::now().format("%y/%m/%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                msg
            ))
        })
        .level(log_level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}
