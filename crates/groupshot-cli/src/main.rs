use std::env;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use groupshot_contracts::catalog::{
    pose_catalog, AspectRatio, PoseId, StyleSelection, ALL_ASPECT_RATIOS, DEFAULT_SCENE, SCENES,
};
use groupshot_contracts::chat::{parse_intent, WIZARD_HELP_COMMANDS};
use groupshot_contracts::events::SessionEvents;
use groupshot_contracts::intake::{ImageIntake, MAX_PEOPLE, MIN_PEOPLE};
use groupshot_contracts::prefs::{load_theme, store_theme, Theme};
use groupshot_contracts::session::{reduce, ResultImage, SessionAction, SessionState, Step};
use groupshot_engine::{
    progress_percent, progress_status, ComposeEngine, CredentialGate, DryrunModel,
    EnvCredentialGate, GeminiModel, GenerateError, ImageModel, ImagePayload,
};
use serde_json::{json, Map, Value};

#[derive(Debug, Parser)]
#[command(name = "groupshot", version, about = "Guided group photo composer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive step-by-step wizard.
    Wizard(WizardArgs),
    /// One-shot composition from the command line.
    Compose(ComposeArgs),
}

#[derive(Debug, Parser)]
struct WizardArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long, default_value = "gemini-2.5-flash-image")]
    model: String,
    /// Use the offline placeholder provider instead of the remote model.
    #[arg(long)]
    dryrun: bool,
    #[arg(long)]
    prefs: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct ComposeArgs {
    /// Portrait file; repeat for each person (2-5, order binds identities).
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,
    #[arg(long, default_value = "lineup")]
    pose: String,
    #[arg(long)]
    scene: Option<String>,
    #[arg(long, default_value = "1:1")]
    ratio: String,
    /// Let the model restyle clothing instead of preserving outfits.
    #[arg(long)]
    adapt_outfits: bool,
    /// Render each person against the scene individually instead of one
    /// shared environment.
    #[arg(long)]
    separate_backgrounds: bool,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long, default_value = "gemini-2.5-flash-image")]
    model: String,
    #[arg(long)]
    dryrun: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("groupshot error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Wizard(args) => {
            run_wizard(args)?;
            Ok(0)
        }
        Command::Compose(args) => run_compose(args),
    }
}

/// Interactive gate: when no key is present, asks the user to paste one and
/// publishes it to the environment for the rest of the session.
struct PromptCredentialGate;

impl CredentialGate for PromptCredentialGate {
    fn has_credential(&self) -> bool {
        GeminiModel::api_key().is_some()
    }

    fn request_credential(&self) -> Result<()> {
        println!("A Gemini API key is required. Paste one to continue (empty to cancel):");
        print!("key> ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        let key = line.trim();
        if key.is_empty() {
            bail!("no API key provided");
        }
        env::set_var("GEMINI_API_KEY", key);
        Ok(())
    }
}

/// The dryrun provider needs no credential.
struct AlwaysReadyGate;

impl CredentialGate for AlwaysReadyGate {
    fn has_credential(&self) -> bool {
        true
    }

    fn request_credential(&self) -> Result<()> {
        Ok(())
    }
}

fn build_engine(
    out: &Path,
    events: Option<&Path>,
    model_name: &str,
    dryrun: bool,
    interactive: bool,
) -> Result<ComposeEngine> {
    let events_path = events
        .map(Path::to_path_buf)
        .unwrap_or_else(|| out.join("events.jsonl"));
    let (model, credentials): (Box<dyn ImageModel>, Box<dyn CredentialGate>) = if dryrun {
        (Box::new(DryrunModel), Box::new(AlwaysReadyGate))
    } else if interactive {
        (Box::new(GeminiModel::new()), Box::new(PromptCredentialGate))
    } else {
        (Box::new(GeminiModel::new()), Box::new(EnvCredentialGate))
    };
    ComposeEngine::new(
        out,
        events_path,
        model,
        credentials,
        Some(model_name.to_string()),
    )
}

fn run_wizard(args: WizardArgs) -> Result<()> {
    let engine = build_engine(
        &args.out,
        args.events.as_deref(),
        &args.model,
        args.dryrun,
        true,
    )?;
    let events = engine.events();
    let prefs_path = args
        .prefs
        .unwrap_or_else(|| args.out.join("prefs.json"));
    let mut theme = load_theme(&prefs_path);

    let mut state = SessionState::new();
    let mut edit_error: Option<String> = None;

    println!(
        "Groupshot wizard started ({} theme, {} provider). Type /help for commands.",
        theme.as_str(),
        engine.provider_name()
    );
    print_step(&state);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{}> ", state.step.as_str());
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);
        match intent.action.as_str() {
            "noop" => continue,
            "quit" => break,
            "help" => {
                println!("Commands: {}", WIZARD_HELP_COMMANDS.join(" "));
            }
            "begin" => {
                if !apply_navigation(&events, &mut state, SessionAction::Begin)? {
                    println!("Already past the landing screen.");
                }
            }
            "advance" => {
                if !apply_navigation(&events, &mut state, SessionAction::Advance)? {
                    explain_blocked_advance(&state);
                }
            }
            "back" => match previous_step(state.step) {
                Some(target) => {
                    apply_navigation(&events, &mut state, SessionAction::NavigateTo(target))?;
                }
                None => println!("Nothing to go back to from here."),
            },
            "goto_step" => {
                let value = string_arg(&intent.command_args, "value");
                match Step::parse(&value) {
                    Some(target) => {
                        if !apply_navigation(
                            &events,
                            &mut state,
                            SessionAction::NavigateTo(target),
                        )? {
                            println!("Step '{}' is not reachable yet.", target.as_str());
                        }
                    }
                    None => println!("/goto expects one of: upload, pose, style, generate"),
                }
            }
            "status" => print_status(&state, theme, edit_error.as_deref()),
            "list_poses" => {
                for spec in pose_catalog().values() {
                    println!(
                        "{} {:<12} {} ({})",
                        spec.emblem,
                        spec.id.as_str(),
                        spec.display_name,
                        spec.hint
                    );
                }
            }
            "list_scenes" => {
                for scene in SCENES {
                    println!("{scene}");
                }
                let ratios: Vec<&str> = ALL_ASPECT_RATIOS
                    .iter()
                    .map(|ratio| ratio.as_str())
                    .collect();
                println!("Aspect ratios: {}", ratios.join(" "));
            }
            "add_image" => {
                let slot = slot_arg(&intent.command_args);
                let path = string_arg(&intent.command_args, "path");
                handle_add(&events, &mut state, slot, &path)?;
            }
            "remove_image" => match slot_arg(&intent.command_args) {
                Some(number) if number >= 1 && number as usize <= state.images.len() => {
                    state = reduce(
                        &state,
                        SessionAction::RemoveImage {
                            slot: number as usize - 1,
                        },
                    );
                    emit_images_changed(&events, &state)?;
                    println!("Removed person {number}; {} remaining.", state.images.len());
                }
                _ => println!(
                    "/remove expects a person number between 1 and {}.",
                    state.images.len().max(1)
                ),
            },
            "toggle_reference" => match slot_arg(&intent.command_args)
                .filter(|number| *number >= 1)
                .and_then(|number| state.images.get(number as usize - 1).cloned())
            {
                Some(person) => {
                    state = reduce(
                        &state,
                        SessionAction::ToggleReferenceFace {
                            id: person.id.clone(),
                        },
                    );
                    let flagged = state
                        .images
                        .images()
                        .iter()
                        .find(|image| image.id == person.id)
                        .map(|image| image.reference_face)
                        .unwrap_or(false);
                    println!(
                        "Reference face {} for that portrait.",
                        if flagged { "set" } else { "cleared" }
                    );
                }
                None => println!("/reference expects a person number."),
            },
            "select_pose" => {
                let value = string_arg(&intent.command_args, "value");
                match PoseId::parse(&value) {
                    Some(pose) => {
                        state = reduce(&state, SessionAction::SelectPose(pose));
                        events.emit(
                            "pose_selected",
                            json_object(json!({ "pose": pose.as_str() })),
                        )?;
                        println!("Pose set to {}.", pose_catalog()[&pose].display_name);
                    }
                    None => {
                        let ids: Vec<&str> =
                            pose_catalog().keys().map(|pose| pose.as_str()).collect();
                        println!("Unknown pose. Available: {}", ids.join(" "));
                    }
                }
            }
            "set_scene" => {
                let value = string_arg(&intent.command_args, "value");
                match canonical_scene(&value) {
                    Some(scene) => {
                        state = reduce(&state, SessionAction::SetScene(scene.to_string()));
                        emit_style_changed(&events, &state)?;
                        println!("Scene set to {scene}.");
                    }
                    None => println!("Unknown scene. Available: {}", SCENES.join(" | ")),
                }
            }
            "set_ratio" => {
                let value = string_arg(&intent.command_args, "value");
                match AspectRatio::parse(&value) {
                    Some(ratio) => {
                        state = reduce(&state, SessionAction::SetAspectRatio(ratio));
                        emit_style_changed(&events, &state)?;
                        println!("Aspect ratio set to {}.", ratio.as_str());
                    }
                    None => {
                        let ratios: Vec<&str> = ALL_ASPECT_RATIOS
                            .iter()
                            .map(|ratio| ratio.as_str())
                            .collect();
                        println!("Unknown ratio. Available: {}", ratios.join(" "));
                    }
                }
            }
            "set_outfits" => match bool_arg(&intent.command_args, "enabled") {
                Some(enabled) => {
                    state = reduce(&state, SessionAction::SetPreserveOutfits(enabled));
                    emit_style_changed(&events, &state)?;
                    println!(
                        "Outfit preservation {}.",
                        if enabled { "on" } else { "off" }
                    );
                }
                None => println!("/outfits expects on or off."),
            },
            "set_background" => match bool_arg(&intent.command_args, "enabled") {
                Some(enabled) => {
                    state = reduce(&state, SessionAction::SetSharedBackground(enabled));
                    emit_style_changed(&events, &state)?;
                    println!(
                        "Shared background {}.",
                        if enabled { "on" } else { "off" }
                    );
                }
                None => println!("/background expects on or off."),
            },
            "generate" => {
                if state.step == Step::Generate {
                    run_generation(&engine, &mut state);
                } else {
                    println!("Generate is available once you reach the generate step (/next).");
                }
            }
            "regenerate" => {
                if state.result_image.is_some() {
                    apply_navigation(&events, &mut state, SessionAction::NavigateTo(Step::Generate))?;
                    run_generation(&engine, &mut state);
                } else {
                    println!("Nothing to regenerate yet.");
                }
            }
            "edit_image" => {
                let instruction = intent.prompt.clone().unwrap_or_default();
                run_edit(&engine, &mut state, &mut edit_error, &instruction);
            }
            "free_text" => {
                if state.step == Step::Result {
                    let instruction = intent.prompt.clone().unwrap_or_default();
                    run_edit(&engine, &mut state, &mut edit_error, &instruction);
                } else {
                    println!("Unrecognized input. Type /help for commands.");
                }
            }
            "export" => match state.result_image.as_ref() {
                Some(result) => {
                    let payload = ImagePayload {
                        bytes: result.bytes.clone(),
                        mime_type: Some(result.mime_type.clone()),
                    };
                    let path = engine.export(&payload)?;
                    println!("Saved {}", path.display());
                }
                None => println!("No result to export yet."),
            },
            "toggle_theme" => {
                theme = theme.toggled();
                store_theme(&prefs_path, theme)?;
                events.emit(
                    "theme_changed",
                    json_object(json!({ "theme": theme.as_str() })),
                )?;
                println!("Theme set to {}.", theme.as_str());
            }
            "start_over" => {
                state = reduce(&state, SessionAction::StartOver);
                edit_error = None;
                events.emit("session_reset", Map::new())?;
                println!("Session reset.");
                print_step(&state);
            }
            _ => println!("Unknown command. Type /help for commands."),
        }
    }

    Ok(())
}

fn run_compose(args: ComposeArgs) -> Result<i32> {
    if args.images.len() < MIN_PEOPLE || args.images.len() > MAX_PEOPLE {
        bail!(
            "provide between {MIN_PEOPLE} and {MAX_PEOPLE} --image portraits (got {})",
            args.images.len()
        );
    }
    let Some(pose) = PoseId::parse(&args.pose) else {
        let ids: Vec<&str> = pose_catalog().keys().map(|pose| pose.as_str()).collect();
        bail!("unknown pose '{}'; available: {}", args.pose, ids.join(" "));
    };
    let scene = match args.scene.as_deref() {
        Some(requested) => canonical_scene(requested)
            .with_context(|| format!("unknown scene '{requested}'; available: {}", SCENES.join(" | ")))?
            .to_string(),
        None => DEFAULT_SCENE.to_string(),
    };
    let Some(aspect_ratio) = AspectRatio::parse(&args.ratio) else {
        let ratios: Vec<&str> = ALL_ASPECT_RATIOS
            .iter()
            .map(|ratio| ratio.as_str())
            .collect();
        bail!("unknown ratio '{}'; available: {}", args.ratio, ratios.join(" "));
    };
    let style = StyleSelection {
        scene,
        aspect_ratio,
        preserve_outfits: !args.adapt_outfits,
        shared_background: !args.separate_backgrounds,
    };

    let engine = build_engine(
        &args.out,
        args.events.as_deref(),
        &args.model,
        args.dryrun,
        false,
    )?;

    let mut intake = ImageIntake::new();
    for (slot, path) in args.images.iter().enumerate() {
        let mime_type = mime_for_path(path).with_context(|| {
            format!(
                "{} is not a supported portrait (JPEG, PNG, or WebP)",
                path.display()
            )
        })?;
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        if intake.add_or_replace(slot, bytes, mime_type).is_none() {
            bail!("portrait {} was rejected by the intake store", path.display());
        }
    }

    match engine.generate(intake.images(), pose, &style) {
        Ok(payload) => {
            let path = engine.export(&payload)?;
            println!("Saved {}", path.display());
            Ok(0)
        }
        Err(GenerateError::AuthRequired) => {
            eprintln!("Sign-in required: set GEMINI_API_KEY or GOOGLE_API_KEY and retry.");
            Ok(2)
        }
        Err(GenerateError::Remote(message)) => {
            eprintln!("Generation failed: {message}");
            Ok(1)
        }
    }
}

fn run_generation(engine: &ComposeEngine, state: &mut SessionState) {
    if state.is_generating {
        return;
    }
    let Some(pose) = state.selected_pose else {
        println!("Select a pose first (/pose <id>).");
        return;
    };

    *state = reduce(state, SessionAction::GenerationStarted);
    let ticker = ProgressTicker::start();
    let outcome = engine.generate(state.images.images(), pose, &state.style);
    ticker.stop();

    match outcome {
        Ok(payload) => {
            let mime_type = payload
                .mime_type
                .clone()
                .unwrap_or_else(|| "image/png".to_string());
            *state = reduce(
                state,
                SessionAction::GenerationSucceeded(ResultImage {
                    bytes: payload.bytes,
                    mime_type,
                }),
            );
            println!("Composite ready. /edit <instruction> to refine, /export to save.");
        }
        Err(GenerateError::AuthRequired) => {
            *state = reduce(state, SessionAction::GenerationDeferred);
            println!("Sign-in was not completed; /generate to try again once a key is set.");
        }
        Err(GenerateError::Remote(message)) => {
            *state = reduce(state, SessionAction::GenerationFailed(message.clone()));
            println!("Generation failed: {message}");
            println!("/generate to retry, /back to adjust the style.");
        }
    }
}

fn run_edit(
    engine: &ComposeEngine,
    state: &mut SessionState,
    edit_error: &mut Option<String>,
    instruction: &str,
) {
    let Some(current) = state.result_image.clone() else {
        println!("No result to edit yet.");
        return;
    };
    if instruction.trim().is_empty() {
        return;
    }

    *edit_error = None;
    let ticker = ProgressTicker::start();
    let outcome = engine.edit(
        &ImagePayload {
            bytes: current.bytes,
            mime_type: Some(current.mime_type),
        },
        instruction,
    );
    ticker.stop();

    match outcome {
        Ok(Some(payload)) => {
            let mime_type = payload
                .mime_type
                .clone()
                .unwrap_or_else(|| "image/png".to_string());
            // Replaces the displayed result in place; the step stays `result`.
            *state = reduce(
                state,
                SessionAction::GenerationSucceeded(ResultImage {
                    bytes: payload.bytes,
                    mime_type,
                }),
            );
            println!("Edit applied.");
        }
        Ok(None) => {}
        Err(err) => {
            let message = match err {
                GenerateError::AuthRequired => {
                    "Sign-in required before editing.".to_string()
                }
                GenerateError::Remote(message) => message,
            };
            println!("Edit failed: {message}");
            *edit_error = Some(message);
        }
    }
}

fn handle_add(
    events: &SessionEvents,
    state: &mut SessionState,
    slot: Option<u64>,
    path_text: &str,
) -> Result<()> {
    if path_text.is_empty() {
        println!("/add expects a file path (optionally preceded by a person number).");
        return Ok(());
    }
    let path = PathBuf::from(path_text);
    let Some(mime_type) = mime_for_path(&path) else {
        println!("Only JPEG, PNG, and WebP portraits are supported.");
        return Ok(());
    };
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            println!("Could not read {}: {err}", path.display());
            return Ok(());
        }
    };

    let slot = slot
        .map(|number| (number as usize).saturating_sub(1))
        .unwrap_or_else(|| state.images.len());
    let before = state.images.len();
    let replacing = slot < before;
    *state = reduce(
        state,
        SessionAction::AddOrReplaceImage {
            slot,
            bytes,
            mime_type: mime_type.to_string(),
        },
    );
    if !replacing && state.images.len() == before {
        println!(
            "Slot {} is not available; the store holds at most {MAX_PEOPLE} portraits.",
            slot + 1
        );
        return Ok(());
    }
    emit_images_changed(events, state)?;
    println!(
        "Person {} {} from {} ({}/{MAX_PEOPLE}).",
        slot + 1,
        if replacing { "replaced" } else { "added" },
        path.display(),
        state.images.len()
    );
    Ok(())
}

/// Prints rotating status lines while a remote call is in flight. Purely
/// cosmetic; the call's outcome is the only real completion signal.
struct ProgressTicker {
    done: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl ProgressTicker {
    fn start() -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        let handle = thread::spawn(move || {
            let started = Instant::now();
            let mut next_print = Duration::from_secs(0);
            while !flag.load(Ordering::SeqCst) {
                let elapsed = started.elapsed();
                if elapsed >= next_print {
                    println!(
                        "[{:>4.1}%] {}",
                        progress_percent(elapsed),
                        progress_status(elapsed)
                    );
                    next_print = elapsed + Duration::from_secs(3);
                }
                thread::sleep(Duration::from_millis(200));
            }
        });
        Self { done, handle }
    }

    fn stop(self) {
        self.done.store(true, Ordering::SeqCst);
        let _ = self.handle.join();
    }
}

fn apply_navigation(
    events: &SessionEvents,
    state: &mut SessionState,
    action: SessionAction,
) -> Result<bool> {
    let before = state.step;
    *state = reduce(state, action);
    let changed = state.step != before;
    if changed {
        events.emit(
            "step_changed",
            json_object(json!({
                "from": before.as_str(),
                "to": state.step.as_str(),
            })),
        )?;
        print_step(state);
    }
    Ok(changed)
}

fn explain_blocked_advance(state: &SessionState) {
    match state.step {
        Step::Upload => println!(
            "Add between {MIN_PEOPLE} and {MAX_PEOPLE} portraits first ({} so far).",
            state.images.len()
        ),
        Step::Pose => println!("Select a pose first (/poses to list them)."),
        Step::Generate => println!("Run /generate; the result step follows a successful render."),
        Step::Result => println!("Use /edit, /export, /regenerate, or /restart from here."),
        _ => println!("Use /start to begin."),
    }
}

fn print_step(state: &SessionState) {
    match state.step {
        Step::Landing => println!("Landing. /start to begin a new group photo."),
        Step::Upload => println!(
            "Upload step: /add <path> for each portrait ({}/{MAX_PEOPLE} so far, need at least {MIN_PEOPLE}).",
            state.images.len()
        ),
        Step::Pose => println!("Pose step: /poses to browse, /pose <id> to choose."),
        Step::Style => println!(
            "Style step: /scenes, /scene <name>, /ratio <r>, /outfits on|off, /background on|off. Defaults are fine; /next when ready."
        ),
        Step::Generate => println!("Generate step: /generate to compose the group photo."),
        Step::Result => println!(
            "Result ready: /edit <instruction> to refine, /export to save, /regenerate for another take."
        ),
    }
}

fn print_status(state: &SessionState, theme: Theme, edit_error: Option<&str>) {
    println!("step: {}", state.step.as_str());
    println!("theme: {}", theme.as_str());
    println!("portraits: {}/{MAX_PEOPLE}", state.images.len());
    for (idx, person) in state.images.images().iter().enumerate() {
        println!(
            "  person {}: {}{}",
            idx + 1,
            person.mime_type,
            if person.reference_face {
                " [reference face]"
            } else {
                ""
            }
        );
    }
    match state.selected_pose {
        Some(pose) => println!("pose: {}", pose.as_str()),
        None => println!("pose: (none)"),
    }
    println!(
        "style: scene={} ratio={} outfits={} shared-background={}",
        state.style.scene,
        state.style.aspect_ratio.as_str(),
        state.style.preserve_outfits,
        state.style.shared_background
    );
    println!(
        "result: {}",
        if state.result_image.is_some() {
            "ready"
        } else {
            "(none)"
        }
    );
    if let Some(error) = state.last_error.as_deref() {
        println!("last error: {error}");
    }
    if let Some(error) = edit_error {
        println!("edit error: {error}");
    }
}

fn emit_images_changed(events: &SessionEvents, state: &SessionState) -> Result<()> {
    events.emit(
        "images_changed",
        json_object(json!({
            "count": state.images.len(),
            "valid": state.images.count_valid(),
        })),
    )?;
    Ok(())
}

fn emit_style_changed(events: &SessionEvents, state: &SessionState) -> Result<()> {
    events.emit(
        "style_changed",
        json_object(json!({
            "scene": state.style.scene,
            "aspect_ratio": state.style.aspect_ratio.as_str(),
            "preserve_outfits": state.style.preserve_outfits,
            "shared_background": state.style.shared_background,
        })),
    )?;
    Ok(())
}

fn previous_step(step: Step) -> Option<Step> {
    match step {
        Step::Pose => Some(Step::Upload),
        Step::Style => Some(Step::Pose),
        Step::Generate => Some(Step::Style),
        _ => None,
    }
}

fn canonical_scene(requested: &str) -> Option<&'static str> {
    let normalized = requested.trim().to_ascii_lowercase();
    SCENES
        .iter()
        .copied()
        .find(|scene| scene.to_ascii_lowercase() == normalized)
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn string_arg(args: &std::collections::BTreeMap<String, Value>, key: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn slot_arg(args: &std::collections::BTreeMap<String, Value>) -> Option<u64> {
    args.get("slot").and_then(Value::as_u64)
}

fn bool_arg(args: &std::collections::BTreeMap<String, Value>, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

fn json_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use groupshot_contracts::session::Step;

    use super::{canonical_scene, mime_for_path, previous_step};

    #[test]
    fn mime_inference_covers_the_accepted_types() {
        assert_eq!(mime_for_path(Path::new("a.jpg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("b.JPEG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("c.png")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("d.webp")), Some("image/webp"));
        assert_eq!(mime_for_path(Path::new("e.gif")), None);
        assert_eq!(mime_for_path(Path::new("noext")), None);
    }

    #[test]
    fn back_walks_the_linear_flow_only() {
        assert_eq!(previous_step(Step::Pose), Some(Step::Upload));
        assert_eq!(previous_step(Step::Style), Some(Step::Pose));
        assert_eq!(previous_step(Step::Generate), Some(Step::Style));
        assert_eq!(previous_step(Step::Landing), None);
        assert_eq!(previous_step(Step::Upload), None);
        assert_eq!(previous_step(Step::Result), None);
    }

    #[test]
    fn scenes_match_case_insensitively_to_the_canonical_name() {
        assert_eq!(
            canonical_scene("outdoor sunny park"),
            Some("Outdoor sunny park")
        );
        assert_eq!(canonical_scene("the moon"), None);
    }
}
