pub mod logging {
    use std::fs::File;
    use std::io::{self, Write};

    use env_logger::{Env, Target};

    use crate::config::config::SimConfig;
    use crate::error::error::{Result, SimError};

    /// Writer that stops passing data through after `limit` lines.
    ///
    /// Once the ceiling is hit, or the inner writer fails, further writes
    /// are accepted and dropped, so a full or broken log never reaches the
    /// code doing the logging.
    pub struct LineCappedWriter<W: Write> {
        inner: W,
        lines: usize,
        limit: usize,
        disabled: bool,
    }

    impl<W: Write> LineCappedWriter<W> {
        pub fn new(inner: W, limit: usize) -> LineCappedWriter<W> {
            LineCappedWriter {
                inner,
                lines: 0,
                limit,
                disabled: limit == 0,
            }
        }

        pub fn lines_written(&self) -> usize {
            self.lines
        }

        pub fn is_disabled(&self) -> bool {
            self.disabled
        }

        pub fn into_inner(self) -> W {
            self.inner
        }
    }

    impl<W: Write> Write for LineCappedWriter<W> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.disabled {
                return Ok(buf.len());
            }

            // cut the buffer right after the last line we are allowed to keep.
            let remaining = self.limit - self.lines;
            let mut end = buf.len();
            let mut seen = 0;
            for (idx, byte) in buf.iter().enumerate() {
                if *byte == b'\n' {
                    seen += 1;
                    if seen == remaining {
                        end = idx + 1;
                        break;
                    }
                }
            }

            if self.inner.write_all(&buf[..end]).is_err() {
                self.disabled = true;
                return Ok(buf.len());
            }
            self.lines += seen;
            if self.lines >= self.limit {
                self.disabled = true;
                let _ = self.inner.flush();
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.inner.flush().is_err() {
                self.disabled = true;
            }
            Ok(())
        }
    }

    /// Send every log record to the configured file, one line per record.
    /// The filter comes from `PAGING_LOG` and defaults to `info`.
    pub fn init(config: &SimConfig) -> Result<()> {
        let file = File::create(&config.log_file).map_err(SimError::LogFile)?;
        let writer = LineCappedWriter::new(file, config.log_line_limit);

        env_logger::Builder::from_env(Env::default().filter_or("PAGING_LOG", "info"))
            .target(Target::Pipe(Box::new(writer)))
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .try_init()?;
        Ok(())
    }

}
