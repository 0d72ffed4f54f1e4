//! CLI command implementations

use anyhow::Context;
use console::style;
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};
use vpaid_core::{
    resolve as resolve_media, AdController, AdEvent, AdState, AttributeSet, CreativeConfig,
    CreativeData, CreativeId, Environment, EventKind, HeadlessContainerProvider,
    HeadlessVideoSlot, MediaDescriptor, ViewMode,
};

use crate::output::{attribute_table, event_log, to_json, OutputFormat};
use crate::script::parse_script;

/// Host-side arguments to `initAd`
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub params: PathBuf,
    pub config: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub view_mode: String,
    pub bitrate: u32,
    pub autoplay: bool,
}

/// Creative-side payload for `trigger`
#[derive(Debug, Clone, Default)]
pub struct SignalArgs {
    pub url: String,
    pub id: String,
    pub player_handles: bool,
    pub message: String,
}

type EventLog = Rc<RefCell<Vec<AdEvent>>>;

/// A headless creative with every lifecycle event recorded
struct Session {
    ad: AdController,
    video: HeadlessVideoSlot,
    log: EventLog,
}

impl Session {
    fn open(options: &InitOptions) -> anyhow::Result<Self> {
        let config = match &options.config {
            Some(path) => CreativeConfig::from_json(&read_file(path)?)?,
            None => CreativeConfig::default(),
        };
        let view_mode: ViewMode = options.view_mode.parse()?;
        let data = CreativeData::new(read_file(&options.params)?);

        let mut ad = AdController::new(config, HeadlessContainerProvider::new());
        let log: EventLog = Rc::new(RefCell::new(Vec::new()));
        for kind in EventKind::LIFECYCLE {
            ad.subscribe_with(kind, log.clone(), |log, event| {
                debug!(event = %event, "Host received");
                log.borrow_mut().push(event.clone());
            });
        }

        let video = HeadlessVideoSlot::new();
        let environment = Environment::new(video.clone()).with_autoplay(options.autoplay);
        ad.handshake_version(vpaid_core::VPAID_VERSION);
        ad.init_ad(
            options.width,
            options.height,
            view_mode,
            options.bitrate,
            &data,
            environment,
        )
        .context("initAd failed")?;

        info!(creative_id = %ad.id(), "Creative initialized");
        Ok(Self { ad, video, log })
    }

    fn events(&self) -> Vec<AdEvent> {
        self.log.borrow().clone()
    }

    fn report(&self) -> SessionReport<'_> {
        let video = self.video.state();
        SessionReport {
            creative_id: self.ad.id(),
            state: self.ad.state(),
            media: self.ad.media(),
            events: self.events(),
            attributes: self.ad.attributes(),
            video: VideoReport {
                playing: video.playing,
                visible: video.visible,
                play_count: video.play_count,
                awaiting_load: video.awaiting_load,
            },
        }
    }
}

#[derive(Serialize)]
struct VideoReport {
    playing: bool,
    visible: bool,
    play_count: u32,
    awaiting_load: bool,
}

#[derive(Serialize)]
struct SessionReport<'a> {
    creative_id: CreativeId,
    state: AdState,
    media: Option<&'a MediaDescriptor>,
    events: Vec<AdEvent>,
    attributes: &'a AttributeSet,
    video: VideoReport,
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

fn print_session(session: &Session, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(&session.report())),
        OutputFormat::Text => {
            let report = session.report();
            println!("{} {}", style("Creative").bold(), report.creative_id);
            println!("  State: {}", report.state);
            if let Some(media) = report.media {
                println!("  Media: {}", media);
            }
            println!(
                "  Video: playing={} visible={} plays={}{}",
                report.video.playing,
                report.video.visible,
                report.video.play_count,
                if report.video.awaiting_load {
                    " (awaiting loadeddata)"
                } else {
                    ""
                }
            );

            println!("\n{}", style("Events:").bold());
            println!("{}", event_log(&report.events));

            println!("\n{}", style("Attributes:").bold());
            println!("{}", attribute_table(report.attributes));
        }
    }
}

/// Resolve the media file an AdParameters document points at
pub fn resolve(params: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let media = resolve_media(&read_file(params)?)?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&media)),
        OutputFormat::Text => {
            println!("{}", style("Resolved media:").bold());
            println!("  URL:  {}", media.url);
            println!("  Type: {}", media.mime_type);
        }
    }

    Ok(())
}

/// Initialize a creative and replay a host script against it
pub fn run(options: &InitOptions, script: &str, format: OutputFormat) -> anyhow::Result<()> {
    let ops = parse_script(script)?;
    let mut session = Session::open(options)?;

    for op in &ops {
        debug!(op = ?op, "Applying host op");
        op.apply(&mut session.ad, &session.video);
    }

    print_session(&session, format);
    Ok(())
}

/// Initialize a creative and fire one creative-initiated event
pub fn trigger(
    options: &InitOptions,
    event: &str,
    args: SignalArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut session = Session::open(options)?;
    session.log.borrow_mut().clear();

    let kind = EventKind::from(event);
    let delivered = match kind {
        EventKind::ClickThru => session
            .ad
            .click_thru(args.url, args.id, args.player_handles)
            .is_ok(),
        EventKind::Error => session.ad.report_error(args.message).is_ok(),
        EventKind::Log => session.ad.log_message(args.message).is_ok(),
        EventKind::Interaction => session.ad.interaction(args.id).is_ok(),
        other => session.ad.trigger(AdEvent::signal(other)),
    };

    if !delivered {
        eprintln!(
            "{} no subscriber for {}",
            style("warning:").yellow().bold(),
            event
        );
    }

    print_session(&session, format);
    Ok(())
}
