/// yt-dlp subprocess driver.
///
/// Spawns the yt-dlp executable once per listing or acquisition. Tool
/// output is forwarded line by line to tracing under the `yt_dlp` target;
/// the tail of stderr is kept to explain a failed exit.
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::errors::ProviderError;
use crate::listing::ListingEntry;
use crate::providers::{AcquisitionProvider, AcquisitionRequest, ListingProvider, PostProcessor};

/// Lines of stderr kept for error reporting.
const STDERR_TAIL_LINES: usize = 40;

pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Flat, error-tolerant, single JSON document.
    pub fn listing_args(url: &str) -> Vec<OsString> {
        [
            "--flat-playlist",
            "--dump-single-json",
            "--ignore-errors",
            "--no-warnings",
            "--quiet",
            "--",
            url,
        ]
        .into_iter()
        .map(OsString::from)
        .collect()
    }

    pub fn acquisition_args(request: &AcquisitionRequest) -> Vec<OsString> {
        let options = &request.options;
        let mut args: Vec<OsString> = vec![
            "-f".into(),
            options.format.as_str().into(),
            "-o".into(),
            request.output_path_template().into_os_string(),
            "--write-thumbnail".into(),
            "--convert-thumbnails".into(),
            options.thumbnail_format.as_str().into(),
            "--no-playlist".into(),
            "--newline".into(),
            "--retries".into(),
            options.retries.to_string().into(),
            "--fragment-retries".into(),
            options.fragment_retries.to_string().into(),
        ];

        if let Some(dir) = request.ffmpeg.location() {
            args.push("--ffmpeg-location".into());
            args.push(dir.as_os_str().to_owned());
        }

        for pp in &request.postprocessors {
            match pp {
                PostProcessor::ExtractAudio { codec, quality } => {
                    args.push("--extract-audio".into());
                    args.push("--audio-format".into());
                    args.push(codec.as_str().into());
                    args.push("--audio-quality".into());
                    args.push(quality.as_str().into());
                    // LAME VBR quality
                    args.push("--postprocessor-args".into());
                    args.push(format!("ExtractAudio:-q:a {quality}").into());
                }
                PostProcessor::EmbedMetadata => args.push("--embed-metadata".into()),
                PostProcessor::EmbedThumbnail => args.push("--embed-thumbnail".into()),
            }
        }

        args.push("--".into());
        args.push(request.url.as_str().into());
        args
    }

    fn command(&self, args: Vec<OsString>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ProviderError {
        ProviderError::SpawnFailed {
            program: self.program.clone(),
            source,
        }
    }
}

/// Forward every line to tracing and return the last few.
///
/// Reads to EOF whatever the bytes are: closing the pipe early would kill
/// the tool with SIGPIPE mid-download.
async fn drain_lines<R: AsyncRead + Unpin>(reader: R, keep: usize) -> VecDeque<String> {
    let mut tail = VecDeque::with_capacity(keep);
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(target: "yt_dlp", "Output stream closed: {}", e);
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf).trim_end_matches(['\n', '\r']).to_string();
        debug!(target: "yt_dlp", "{}", line);
        if keep > 0 {
            if tail.len() == keep {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }
    tail
}

fn join_tail(tail: VecDeque<String>) -> String {
    Vec::from(tail).join("\n")
}

#[async_trait]
impl ListingProvider for YtDlp {
    async fn fetch_listing(&self, url: &str) -> Result<Option<ListingEntry>, ProviderError> {
        let output = self
            .command(Self::listing_args(url))
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!(target: "yt_dlp", "{}", line);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return if output.status.success() {
                Ok(None)
            } else {
                Err(ProviderError::from_exit(&self.program, output.status, &stderr))
            };
        }

        // --ignore-errors can exit non-zero while still printing a usable document
        match ListingEntry::from_json(stdout) {
            Ok(root) => Ok(root),
            Err(_) if !output.status.success() => {
                Err(ProviderError::from_exit(&self.program, output.status, &stderr))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl AcquisitionProvider for YtDlp {
    async fn acquire(&self, request: &AcquisitionRequest) -> Result<(), ProviderError> {
        let mut child = self
            .command(Self::acquisition_args(request))
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("no stdout handle"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("no stderr handle"))?;

        let (_, stderr_tail, status) = tokio::join!(
            drain_lines(stdout, 0),
            drain_lines(stderr, STDERR_TAIL_LINES),
            child.wait(),
        );
        let status = status?;

        if status.success() {
            Ok(())
        } else {
            Err(ProviderError::from_exit(&self.program, status, &join_tail(stderr_tail)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolvedBinaryPath;
    use std::path::PathBuf;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn position(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap_or_else(|| panic!("missing {flag}"))
    }

    #[test]
    fn test_listing_args() {
        let args = strings(YtDlp::listing_args("https://www.youtube.com/@Sample/videos"));
        assert!(args.contains(&"--flat-playlist".to_string()));
        assert!(args.contains(&"--ignore-errors".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/@Sample/videos");
    }

    #[test]
    fn test_acquisition_args_system_ffmpeg() {
        let req = AcquisitionRequest::mp3(
            "https://www.youtube.com/watch?v=abc",
            "/music/Sample",
            ResolvedBinaryPath::System,
        );
        let args = strings(YtDlp::acquisition_args(&req));

        assert_eq!(args[position(&args, "-f") + 1], "bestaudio/best");
        assert_eq!(args[position(&args, "-o") + 1], "/music/Sample/%(title)s.%(ext)s");
        assert_eq!(args[position(&args, "--convert-thumbnails") + 1], "jpg");
        assert_eq!(args[position(&args, "--audio-format") + 1], "mp3");
        assert_eq!(args[position(&args, "--audio-quality") + 1], "0");
        assert_eq!(args[position(&args, "--postprocessor-args") + 1], "ExtractAudio:-q:a 0");
        assert_eq!(args[position(&args, "--retries") + 1], "3");
        assert_eq!(args[position(&args, "--fragment-retries") + 1], "3");
        assert!(position(&args, "--embed-metadata") < position(&args, "--embed-thumbnail"));
        assert!(!args.contains(&"--ffmpeg-location".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn test_acquisition_args_bundled_ffmpeg() {
        let req = AcquisitionRequest::mp3(
            "https://www.youtube.com/watch?v=abc",
            "/music/Sample",
            ResolvedBinaryPath::Bundled(PathBuf::from("/opt/chanrip/ffmpeg")),
        );
        let args = strings(YtDlp::acquisition_args(&req));
        assert_eq!(args[position(&args, "--ffmpeg-location") + 1], "/opt/chanrip/ffmpeg");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let ytdlp = YtDlp::new("/definitely/not/a/real/yt-dlp");
        let err = ytdlp.fetch_listing("https://www.youtube.com/@Sample/videos").await.unwrap_err();
        assert!(matches!(err, ProviderError::SpawnFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_acquisition_reports_error_line() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-yt-dlp");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '[youtube] abc: Downloading'\necho 'ERROR: [youtube] abc: Private video' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ytdlp = YtDlp::new(script.to_string_lossy());
        let req = AcquisitionRequest::mp3("https://www.youtube.com/watch?v=abc", dir.path(), ResolvedBinaryPath::System);
        let err = ytdlp.acquire(&req).await.unwrap_err();
        assert!(err.to_string().contains("ERROR: [youtube] abc: Private video"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_output_does_not_abort_download() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-yt-dlp");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             printf '[download] Destination: caf\\351.webm\\n'\n\
             i=0\n\
             while [ $i -lt 4000 ]; do\n\
             echo \"[download]  $i.0% of 3.00MiB at 1.00MiB/s ETA 00:03\"\n\
             i=$((i+1))\n\
             done\n\
             exit 0\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ytdlp = YtDlp::new(script.to_string_lossy());
        let req = AcquisitionRequest::mp3("https://www.youtube.com/watch?v=abc", dir.path(), ResolvedBinaryPath::System);
        let result = ytdlp.acquire(&req).await;
        assert!(result.is_ok(), "{result:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_error_line_survives_non_utf8_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-yt-dlp");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             printf 'WARNING: caf\\351 title\\n' >&2\n\
             echo 'ERROR: [youtube] abc: Private video' >&2\n\
             exit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ytdlp = YtDlp::new(script.to_string_lossy());
        let req = AcquisitionRequest::mp3("https://www.youtube.com/watch?v=abc", dir.path(), ResolvedBinaryPath::System);
        let err = ytdlp.acquire(&req).await.unwrap_err();
        assert!(err.to_string().contains("ERROR: [youtube] abc: Private video"), "{err}");
    }

    #[tokio::test]
    async fn test_drain_lines_keeps_lossy_tail() {
        let input: &[u8] = b"one\r\ncaf\xe9\nthree";
        let tail = drain_lines(input, 2).await;
        assert_eq!(Vec::from(tail), ["caf\u{FFFD}", "three"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_listing_parses_script_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-yt-dlp");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '{\"entries\": [{\"id\": \"v1\", \"title\": \"One\", \"url\": \"v1\"}]}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ytdlp = YtDlp::new(script.to_string_lossy());
        let root = ytdlp.fetch_listing("https://www.youtube.com/@Sample/videos").await.unwrap();
        assert!(matches!(root, Some(ListingEntry::Container { ref entries, .. }) if entries.len() == 1));
    }
}
