//! Host scripts - the sequence of player calls `run` replays against a creative

use anyhow::{anyhow, bail, Context};
use std::str::FromStr;
use vpaid_core::{AdController, HeadlessVideoSlot, ViewMode};

/// One host-side call
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    Start,
    Stop,
    Pause,
    Resume,
    Volume(i64),
    Resize {
        width: u32,
        height: u32,
        view_mode: Option<ViewMode>,
    },
    Expand,
    Collapse,
    Skip,
    /// Fire the video element's `loadeddata` signal
    Loaded,
}

impl FromStr for HostOp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(level) = s.strip_prefix("volume=") {
            let level = level
                .parse::<i64>()
                .with_context(|| format!("bad volume '{}'", level))?;
            return Ok(HostOp::Volume(level));
        }
        if let Some(size) = s.strip_prefix("resize=") {
            return parse_resize(size);
        }

        match s {
            "start" => Ok(HostOp::Start),
            "stop" => Ok(HostOp::Stop),
            "pause" => Ok(HostOp::Pause),
            "resume" => Ok(HostOp::Resume),
            "expand" => Ok(HostOp::Expand),
            "collapse" => Ok(HostOp::Collapse),
            "skip" => Ok(HostOp::Skip),
            "loaded" => Ok(HostOp::Loaded),
            other => Err(anyhow!("unknown host op '{}'", other)),
        }
    }
}

/// `WxH` with an optional `:mode` suffix
fn parse_resize(arg: &str) -> anyhow::Result<HostOp> {
    let (size, view_mode) = match arg.split_once(':') {
        Some((size, mode)) => (size, Some(mode.parse::<ViewMode>()?)),
        None => (arg, None),
    };
    let Some((width, height)) = size.split_once('x') else {
        bail!("resize expects WxH, got '{}'", arg);
    };
    Ok(HostOp::Resize {
        width: width.parse().with_context(|| format!("bad width '{}'", width))?,
        height: height.parse().with_context(|| format!("bad height '{}'", height))?,
        view_mode,
    })
}

/// Parse a comma-separated script. Empty entries are skipped.
pub fn parse_script(script: &str) -> anyhow::Result<Vec<HostOp>> {
    script
        .split(',')
        .filter(|op| !op.trim().is_empty())
        .map(HostOp::from_str)
        .collect()
}

impl HostOp {
    pub fn apply(&self, ad: &mut AdController, video: &HeadlessVideoSlot) {
        match self {
            HostOp::Start => ad.start_ad(),
            HostOp::Stop => ad.stop_ad(),
            HostOp::Pause => ad.pause_ad(),
            HostOp::Resume => ad.resume_ad(),
            HostOp::Volume(level) => ad.set_ad_volume(*level),
            HostOp::Resize {
                width,
                height,
                view_mode,
            } => {
                let mode = view_mode.unwrap_or_else(|| ad.get_ad_view_mode());
                ad.resize_ad(*width, *height, mode);
            }
            HostOp::Expand => ad.expand_ad(),
            HostOp::Collapse => ad.collapse_ad(),
            HostOp::Skip => ad.skip_ad(),
            HostOp::Loaded => {
                if !video.finish_loading() {
                    tracing::debug!("No loadeddata continuation pending");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let ops = parse_script("start, pause,resume,volume=75,skip").unwrap();
        assert_eq!(
            ops,
            vec![
                HostOp::Start,
                HostOp::Pause,
                HostOp::Resume,
                HostOp::Volume(75),
                HostOp::Skip,
            ]
        );
    }

    #[test]
    fn test_parse_empty_script() {
        assert!(parse_script("").unwrap().is_empty());
        assert!(parse_script(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_resize() {
        assert_eq!(
            "resize=1280x720".parse::<HostOp>().unwrap(),
            HostOp::Resize {
                width: 1280,
                height: 720,
                view_mode: None
            }
        );
        assert_eq!(
            "resize=1920x1080:fullscreen".parse::<HostOp>().unwrap(),
            HostOp::Resize {
                width: 1920,
                height: 1080,
                view_mode: Some(ViewMode::Fullscreen)
            }
        );
        assert!("resize=1280".parse::<HostOp>().is_err());
        assert!("resize=1280x720:cinema".parse::<HostOp>().is_err());
    }

    #[test]
    fn test_out_of_range_volume_still_parses() {
        // Range checks belong to the creative, not the script
        assert_eq!("volume=150".parse::<HostOp>().unwrap(), HostOp::Volume(150));
        assert!("volume=loud".parse::<HostOp>().is_err());
    }

    #[test]
    fn test_unknown_op() {
        let err = parse_script("start,rewind").unwrap_err();
        assert!(err.to_string().contains("rewind"));
    }
}
