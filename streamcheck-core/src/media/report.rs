//! Parsed view of the analyzer's JSON report.
//!
//! ffprobe prints several numeric fields (`duration`, `sample_rate`,
//! `bit_rate`, ...) as JSON strings and uses `"N/A"` when a value is unknown,
//! so those fields accept either form and fall back to `None`.

use crate::error::{CoreError, CoreResult};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub const CODEC_TYPE_AUDIO: &str = "audio";
pub const CODEC_TYPE_VIDEO: &str = "video";

/// Container-level facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeFormat {
    pub filename: String,
    pub nb_streams: i64,
    pub format_name: String,
    #[serde(deserialize_with = "de_opt_f64")]
    pub start_time: Option<f64>,
    /// Container-reported duration in seconds.
    #[serde(deserialize_with = "de_opt_f64")]
    pub duration: Option<f64>,
    #[serde(deserialize_with = "de_opt_u64")]
    pub size: Option<u64>,
    #[serde(deserialize_with = "de_opt_u64")]
    pub bit_rate: Option<u64>,
    /// Analyzer confidence, 0-100.
    pub probe_score: i64,
}

/// Facts about one elementary stream.
///
/// A default-constructed value is the placeholder returned when a report has
/// no stream of the requested kind; `channels == 0` and an empty
/// `codec_name` mean "absent".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeStream {
    pub index: i64,
    pub codec_name: String,
    /// "audio" or "video" (ffprobe also reports "data" and "subtitle").
    pub codec_type: String,
    pub profile: String,
    pub width: i64,
    pub height: i64,
    pub channels: i64,
    #[serde(deserialize_with = "de_opt_u64")]
    pub sample_rate: Option<u64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub duration: Option<f64>,
    #[serde(deserialize_with = "de_opt_u64")]
    pub bit_rate: Option<u64>,
    #[serde(deserialize_with = "de_opt_u64")]
    pub nb_frames: Option<u64>,
}

impl ProbeStream {
    pub fn is_audio(&self) -> bool {
        self.codec_type == CODEC_TYPE_AUDIO
    }

    pub fn is_video(&self) -> bool {
        self.codec_type == CODEC_TYPE_VIDEO
    }
}

/// The analyzer's report: container format plus the detected streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeReport {
    pub format: ProbeFormat,
    pub streams: Vec<ProbeStream>,
}

impl ProbeReport {
    /// Parses a report. An empty or whitespace-only body is a partial report.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        if raw.trim().is_empty() {
            return Err(CoreError::PartialReport("analyzer produced no output".to_string()));
        }
        serde_json::from_str(raw)
            .map_err(|e| CoreError::PartialReport(format!("malformed analyzer JSON: {e}")))
    }

    /// Media duration: the container's when present, else the first video
    /// stream's, else the first stream that reports one, else zero.
    pub fn duration(&self) -> Duration {
        let seconds = self
            .format
            .duration
            .or_else(|| {
                self.streams
                    .iter()
                    .find(|s| s.is_video())
                    .and_then(|s| s.duration)
            })
            .or_else(|| self.streams.iter().find_map(|s| s.duration))
            .unwrap_or(0.0);
        Duration::try_from_secs_f64(seconds).unwrap_or_default()
    }

    /// First audio stream, or a zero-value placeholder.
    pub fn audio(&self) -> ProbeStream {
        self.streams
            .iter()
            .find(|s| s.is_audio())
            .cloned()
            .unwrap_or_default()
    }

    /// First video stream, or a zero-value placeholder.
    pub fn video(&self) -> ProbeStream {
        self.streams
            .iter()
            .find(|s| s.is_video())
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "format={} score={} duration={:.3}s streams={}",
            if self.format.format_name.is_empty() { "-" } else { self.format.format_name.as_str() },
            self.format.probe_score,
            self.duration().as_secs_f64(),
            self.streams.len()
        )?;
        for stream in &self.streams {
            write!(f, " [#{} {} {}", stream.index, stream.codec_type, stream.codec_name)?;
            if !stream.profile.is_empty() {
                write!(f, "({})", stream.profile)?;
            }
            if stream.is_video() {
                write!(f, " {}x{}", stream.width, stream.height)?;
            }
            if stream.is_audio() {
                write!(f, " {}ch", stream.channels)?;
                if let Some(rate) = stream.sample_rate {
                    write!(f, " {rate}Hz")?;
                }
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

fn de_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLV_REPORT: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "profile": "High",
                "codec_type": "video",
                "width": 768,
                "height": 320,
                "r_frame_rate": "25/1",
                "duration": "9.960000",
                "bit_rate": "N/A"
            },
            {
                "index": 1,
                "codec_name": "aac",
                "profile": "LC",
                "codec_type": "audio",
                "sample_fmt": "fltp",
                "sample_rate": "44100",
                "channels": 2,
                "channel_layout": "stereo",
                "duration": "9.984000"
            }
        ],
        "format": {
            "filename": "srs-ffprobe-stream-1.flv",
            "nb_streams": 2,
            "format_name": "flv",
            "start_time": "0.000000",
            "duration": "10.012000",
            "size": "1048576",
            "bit_rate": "837866",
            "probe_score": 100
        }
    }"#;

    #[test]
    fn test_parse_flv_report() {
        let report = ProbeReport::parse(FLV_REPORT).unwrap();
        assert_eq!(report.streams.len(), 2);
        assert_eq!(report.format.probe_score, 100);
        assert_eq!(report.format.size, Some(1_048_576));
        assert!((report.duration().as_secs_f64() - 10.012).abs() < 1e-6);

        let video = report.video();
        assert_eq!(video.codec_name, "h264");
        assert_eq!(video.profile, "High");
        assert_eq!((video.width, video.height), (768, 320));
        assert_eq!(video.bit_rate, None);

        let audio = report.audio();
        assert_eq!(audio.codec_name, "aac");
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.sample_rate, Some(44100));
    }

    #[test]
    fn test_zero_stream_report() {
        let report =
            ProbeReport::parse(r#"{"streams": [], "format": {"probe_score": 0}}"#).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.duration(), Duration::ZERO);
        assert_eq!(report.audio(), ProbeStream::default());
        assert_eq!(report.video().codec_name, "");
        assert_eq!(report.audio().channels, 0);
    }

    #[test]
    fn test_duration_falls_back_to_video_stream() {
        let report = ProbeReport::parse(
            r#"{"format": {"duration": "N/A"}, "streams": [
                {"codec_type": "audio", "duration": "3.0"},
                {"codec_type": "video", "duration": 4.5}
            ]}"#,
        )
        .unwrap();
        assert_eq!(report.format.duration, None);
        assert_eq!(report.duration(), Duration::from_millis(4500));
    }

    #[test]
    fn test_duration_falls_back_to_any_stream() {
        let report = ProbeReport::parse(
            r#"{"streams": [{"codec_type": "audio", "duration": "2.5"}]}"#,
        )
        .unwrap();
        assert_eq!(report.duration(), Duration::from_millis(2500));
    }

    #[test]
    fn test_negative_duration_is_zero() {
        let report = ProbeReport::parse(r#"{"format": {"duration": "-1.0"}}"#).unwrap();
        assert_eq!(report.duration(), Duration::ZERO);
    }

    #[test]
    fn test_partial_json_is_rejected() {
        let truncated = &FLV_REPORT[..FLV_REPORT.len() / 2];
        let err = ProbeReport::parse(truncated).unwrap_err();
        assert!(matches!(err, CoreError::PartialReport(_)));

        let err = ProbeReport::parse("  \n").unwrap_err();
        assert!(err.to_string().contains("no output"));
    }

    #[test]
    fn test_display_summarizes_streams() {
        let report = ProbeReport::parse(FLV_REPORT).unwrap();
        let text = report.to_string();
        assert!(text.starts_with("format=flv score=100 duration=10.012s streams=2"));
        assert!(text.contains("[#0 video h264(High) 768x320]"));
        assert!(text.contains("[#1 audio aac(LC) 2ch 44100Hz]"));
    }
}
