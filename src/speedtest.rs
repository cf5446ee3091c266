use crate::config::Config;
use anyhow::Context as _;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;

/// Whole megabytes in `bytes`, rounded down.
pub fn bytes_to_mb(bytes: f64) -> u64 {
    (bytes / MB) as u64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub bytes: u64,
    pub elapsed: Duration,
}

impl Throughput {
    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes as f64 / secs
    }

    pub fn megabits_per_sec(&self) -> f64 {
        self.bytes_per_sec() * 8.0 / 1_000_000.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpeedTestReport {
    pub download: Throughput,
    pub upload: Throughput,
}

impl SpeedTestReport {
    pub fn summary(&self) -> String {
        format!(
            "**Download speed:** {}MB/s ({:.1} Mbit/s)\n**Upload speed:** {}MB/s ({:.1} Mbit/s)",
            bytes_to_mb(self.download.bytes_per_sec()),
            self.download.megabits_per_sec(),
            bytes_to_mb(self.upload.bytes_per_sec()),
            self.upload.megabits_per_sec(),
        )
    }
}

/// Measures HTTP throughput against a download and an upload endpoint.
pub struct SpeedTest {
    client: reqwest::Client,
    download_url: String,
    upload_url: String,
    upload_bytes: usize,
    timeout: Duration,
}

impl SpeedTest {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            download_url: config.speedtest_download_url.clone(),
            upload_url: config.speedtest_upload_url.clone(),
            upload_bytes: config.speedtest_upload_bytes,
            timeout: Duration::from_secs(config.speedtest_timeout_secs),
        }
    }

    pub async fn run(&self) -> anyhow::Result<SpeedTestReport> {
        info!("Speed test: starting");
        let download = self.measure_download().await?;
        let upload = self.measure_upload().await?;
        info!(
            "Speed test: download {:.0} B/s, upload {:.0} B/s",
            download.bytes_per_sec(),
            upload.bytes_per_sec()
        );
        Ok(SpeedTestReport { download, upload })
    }

    async fn measure_download(&self) -> anyhow::Result<Throughput> {
        let started = Instant::now();
        let mut response = self
            .client
            .get(&self.download_url)
            .timeout(self.timeout)
            .send()
            .await
            .context("Download request failed")?
            .error_for_status()?;

        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await? {
            bytes += chunk.len() as u64;
        }

        let elapsed = started.elapsed();
        debug!("Speed test: downloaded {} bytes in {:?}", bytes, elapsed);
        Ok(Throughput { bytes, elapsed })
    }

    async fn measure_upload(&self) -> anyhow::Result<Throughput> {
        let payload = vec![0u8; self.upload_bytes];
        let started = Instant::now();
        self.client
            .post(&self.upload_url)
            .timeout(self.timeout)
            .body(payload)
            .send()
            .await
            .context("Upload request failed")?
            .error_for_status()?;

        let elapsed = started.elapsed();
        debug!("Speed test: uploaded {} bytes in {:?}", self.upload_bytes, elapsed);
        Ok(Throughput {
            bytes: self.upload_bytes as u64,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(0.0), 0);
        assert_eq!(bytes_to_mb(1024.0 * 1024.0 - 1.0), 0);
        assert_eq!(bytes_to_mb(1024.0 * 1024.0), 1);
        assert_eq!(bytes_to_mb(25.5 * 1024.0 * 1024.0), 25);
    }

    #[test]
    fn test_throughput() {
        let t = Throughput {
            bytes: 2_000_000,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(t.bytes_per_sec(), 1_000_000.0);
        assert_eq!(t.megabits_per_sec(), 8.0);

        let instant = Throughput {
            bytes: 10,
            elapsed: Duration::ZERO,
        };
        assert_eq!(instant.bytes_per_sec(), 0.0);
    }

    #[test]
    fn test_summary() {
        let report = SpeedTestReport {
            download: Throughput {
                bytes: 20 * 1024 * 1024,
                elapsed: Duration::from_secs(2),
            },
            upload: Throughput {
                bytes: 5 * 1024 * 1024,
                elapsed: Duration::from_secs(5),
            },
        };
        let summary = report.summary();
        assert!(summary.contains("**Download speed:** 10MB/s"));
        assert!(summary.contains("**Upload speed:** 1MB/s"));
    }
}
