pub mod config;
pub mod report;
pub mod wireless;

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use config::Config;
use wireless::{Analysis, CaptureFile, Session};

/// Core airquality instance: one analysis run over any number of capture files
pub struct AirQuality {
    session: Session,
    files_read: usize,
}

impl AirQuality {
    /// Create a new airquality instance
    pub fn new(config: &Config) -> Self {
        Self {
            session: Session::new(&config.analyzer),
            files_read: 0,
        }
    }

    /// Read every frame of one capture file into the session.
    /// Returns the number of frames read from the file.
    ///
    /// Only a file that cannot be opened is an error. A read failure partway
    /// through (a capture cut off mid-record) ends the file early; the frames
    /// before it are kept and the file counts as read.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<u64> {
        let path = path.as_ref();
        let mut capture = CaptureFile::open(path)?;
        let before = self.session.stats().clone();

        loop {
            match capture.next_frame() {
                Ok(Some(frame)) => {
                    let _ = self.session.process_frame(&frame.data, frame.captured_len);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        "{}: {} after {} frames, keeping what was read",
                        path.display(),
                        e,
                        capture.frames_read()
                    );
                    self.session.mark_partial_file();
                    break;
                }
            }
        }

        let stats = self.session.stats();
        info!(
            "{}: {} frames, {} malformed, {} beacons without tags",
            path.display(),
            capture.frames_read(),
            stats.malformed_frames - before.malformed_frames,
            stats.missing_tags - before.missing_tags,
        );

        self.files_read += 1;
        Ok(capture.frames_read())
    }

    /// Capture files read so far, including ones that ended early
    pub fn files_read(&self) -> usize {
        self.files_read
    }

    /// End the run and compute the channel model
    pub fn finish(self) -> Analysis {
        let analysis = self.session.finish();
        info!(
            "Analysis complete: {} frames decoded, {} entities, {} access points",
            analysis.stats.frames_decoded,
            analysis.registry.len(),
            analysis.registry.access_points().count()
        );
        analysis
    }
}
