mod bulk;
mod client;
mod config;
mod edits;
mod model;
mod resolve;
mod zone;

use crate::bulk::rewrite_all;
use crate::client::BridgeClient;
use crate::config::{Scope, save};
use crate::edits::{Edit, EditError, EditOp, EditSpec, RemovePolicy, apply_edits, resolve_edits};
use crate::model::{GroupedEntity, Light, NewScene, ResourceRef, ResourceType, Scene};
use crate::resolve::{Named, Resolution, resolve, similar_names};
use crate::zone::{generate_scene_name, group_contains_light, lights_matching, project_actions, zone_light_ids};
use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::OnceLock;

static FULL_IDS: OnceLock<bool> = OnceLock::new();

#[derive(Parser)]
#[command(
    name = "huectl",
    version,
    about = "CLI for a Hue bridge's local CLIP v2 API"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "IP",
        help = "Bridge IP override for this invocation (otherwise read from config)"
    )]
    bridge_ip: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "KEY",
        help = "Application key override for this invocation"
    )]
    key: Option<String>,

    #[arg(
        long,
        short = 'o',
        value_enum,
        default_value_t = OutputFormat::Pretty,
        global = true,
        help = "Output format (propagates to subcommands)"
    )]
    output: OutputFormat,

    #[arg(long, global = true, help = "Do not truncate long IDs in table output")]
    full_ids: bool,

    #[arg(
        long,
        value_name = "COL1,COL2",
        global = true,
        help = "Override table columns (comma-separated)"
    )]
    columns: Option<String>,

    #[arg(
        long,
        value_name = "COLUMN",
        global = true,
        help = "Sort table rows by column (ascending)"
    )]
    sort_by: Option<String>,

    #[arg(
        long,
        value_name = "TEXT",
        global = true,
        help = "Filter rows containing TEXT (case-insensitive)"
    )]
    filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Persist bridge IP and application key to the chosen scope
    Configure {
        #[arg(long, value_name = "IP")]
        ip: String,
        #[arg(long, value_name = "KEY")]
        key: String,
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
    },
    /// Show current configuration (secrets masked)
    ConfigShow,
    /// Validate stored credentials against the bridge
    Validate,
    /// List lights
    Lights {
        #[arg(long, short = 'r', help = "Filter by room/zone name")]
        room: Option<String>,
    },
    /// List scenes
    Scenes {
        #[arg(long, short = 'r', help = "Filter by room/zone name")]
        room: Option<String>,
    },
    /// List rooms
    Rooms,
    /// List zones
    Zones,
    /// List switch devices (dimmer switches, buttons)
    Switches,
    /// Raw listing of any resource type
    Get {
        #[arg(value_enum)]
        resource: ResourceTypeArg,
    },
    /// Duplicate a scene under a new name, with optional modifications
    DuplicateScene {
        #[arg(value_name = "SOURCE_SCENE")]
        source_scene: String,
        #[arg(value_name = "NEW_NAME")]
        new_name: String,
        #[arg(
            long = "turn-on",
            value_name = "LIGHT",
            help = "Light to turn ON in the new scene (repeatable)"
        )]
        turn_on: Vec<String>,
        #[arg(
            long = "turn-off",
            value_name = "LIGHT",
            help = "Light to turn OFF in the new scene (repeatable)"
        )]
        turn_off: Vec<String>,
        #[arg(
            long,
            value_name = "SPEC",
            help = "Set brightness: \"LightName=50%\" (repeatable)"
        )]
        brightness: Vec<String>,
        #[arg(
            long = "remove-light",
            value_name = "LIGHT",
            help = "Remove a light from the scene entirely (repeatable)"
        )]
        remove_light: Vec<String>,
        #[arg(
            long,
            short = 'z',
            help = "Restrict the scene search to one room/zone (disambiguates duplicate names)"
        )]
        zone: Option<String>,
        #[arg(long, short = 'y', help = "Skip confirmation prompt")]
        yes: bool,
    },
    /// Apply the same modifications to every scene in a room/zone
    ModifyScenes {
        #[arg(long, short = 'r', help = "Room/zone whose scenes to rewrite")]
        room: String,
        #[arg(
            long = "turn-on",
            value_name = "LIGHT",
            help = "Light to turn ON in all scenes (repeatable)"
        )]
        turn_on: Vec<String>,
        #[arg(
            long = "turn-off",
            value_name = "LIGHT",
            help = "Light to turn OFF in all scenes (repeatable)"
        )]
        turn_off: Vec<String>,
        #[arg(
            long,
            value_name = "SPEC",
            help = "Set brightness: \"LightName=50%\" (repeatable)"
        )]
        brightness: Vec<String>,
        #[arg(
            long = "remove-light",
            value_name = "LIGHT",
            help = "Turn light OFF in all scenes (the bridge requires every group light to stay present)"
        )]
        remove_light: Vec<String>,
        #[arg(long, short = 'y', help = "Skip confirmation prompt")]
        yes: bool,
    },
    /// Project a scene onto a zone, turning absent or excluded lights off
    ZoneScene {
        #[arg(value_name = "SCENE")]
        scene: String,
        #[arg(long, short = 'z', help = "Target zone name")]
        zone: String,
        #[arg(
            long,
            value_name = "PATTERN",
            help = "Light name pattern to exclude (turned off; repeatable)"
        )]
        exclude: Vec<String>,
        #[arg(long, short = 'y', help = "Skip confirmation prompt")]
        yes: bool,
    },
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResourceTypeArg {
    Light,
    Room,
    Zone,
    Scene,
    Device,
    Button,
    Motion,
    BehaviorInstance,
}

impl From<ResourceTypeArg> for ResourceType {
    fn from(value: ResourceTypeArg) -> Self {
        match value {
            ResourceTypeArg::Light => ResourceType::Light,
            ResourceTypeArg::Room => ResourceType::Room,
            ResourceTypeArg::Zone => ResourceType::Zone,
            ResourceTypeArg::Scene => ResourceType::Scene,
            ResourceTypeArg::Device => ResourceType::Device,
            ResourceTypeArg::Button => ResourceType::Button,
            ResourceTypeArg::Motion => ResourceType::Motion,
            ResourceTypeArg::BehaviorInstance => ResourceType::BehaviorInstance,
        }
    }
}

#[derive(Clone)]
struct RenderOpts {
    columns_override: Option<Vec<String>>,
    sort_by: Option<String>,
    filter: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("reading current directory")?;
    FULL_IDS.get_or_init(|| cli.full_ids);

    let render_opts = RenderOpts {
        columns_override: cli.columns.as_ref().map(|c| {
            c.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }),
        sort_by: cli.sort_by.clone(),
        filter: cli.filter.clone(),
    };

    let connect = || -> Result<BridgeClient> {
        let effective = config::resolve(&cwd, cli.bridge_ip.clone(), cli.key.clone())?;
        BridgeClient::new(
            &BridgeClient::base_url_for_ip(&effective.bridge_ip),
            &effective.application_key,
        )
    };

    match cli.command {
        Commands::Configure { ip, key, scope } => {
            let mut existing = config::load_scope(scope.into(), &cwd)?;
            existing.bridge_ip = Some(ip);
            existing.application_key = Some(key);
            let path = save(scope.into(), &existing, &cwd)?;
            println!("Saved bridge credentials to {}", path.display());
        }
        Commands::ConfigShow => {
            let mut masked = config::load(&cwd)?;
            if masked.application_key.is_some() {
                masked.application_key = Some("*****".into());
            }
            println!("{}", serde_json::to_string_pretty(&masked)?);
        }
        Commands::Validate => {
            println!("Validating bridge credentials...");
            match connect().and_then(|client| client.list_lights()) {
                Ok(lights) => println!("Bridge API: ok ({} lights)", lights.len()),
                Err(e) => println!("Bridge API: FAILED ({})", e),
            }
        }
        Commands::Lights { room } => {
            let client = connect()?;
            let mut lights = client.list_lights()?;
            if let Some(room_name) = room {
                let mut groups = client.list_rooms()?;
                groups.extend(client.list_zones()?);
                let group = resolve_group(&room_name, &groups, "room/zone")?;
                lights.retain(|light| group_contains_light(group, light));
            }
            render_rows(
                &light_rows(&lights),
                cli.output,
                &render_opts,
                Some(&["name", "on", "brightness", "archetype", "id"]),
            )?;
        }
        Commands::Scenes { room } => {
            let client = connect()?;
            let scenes = client.list_scenes()?;
            let mut groups = client.list_rooms()?;
            groups.extend(client.list_zones()?);
            let group_filter = match room {
                Some(room_name) => {
                    Some(resolve_group(&room_name, &groups, "room/zone")?.id.clone())
                }
                None => None,
            };
            let group_names: HashMap<&str, &str> = groups
                .iter()
                .map(|g| (g.id.as_str(), g.metadata.name.as_str()))
                .collect();
            let rows: Vec<Value> = scenes
                .iter()
                .filter(|s| {
                    group_filter
                        .as_deref()
                        .is_none_or(|rid| s.group.rid == rid)
                })
                .map(|s| {
                    json!({
                        "name": s.metadata.name,
                        "group": group_names.get(s.group.rid.as_str()),
                        "lights": s.actions.len(),
                        "speed": s.speed,
                        "auto_dynamic": s.auto_dynamic,
                        "id": s.id,
                    })
                })
                .collect();
            render_rows(
                &rows,
                cli.output,
                &render_opts,
                Some(&["name", "group", "lights", "speed", "auto_dynamic", "id"]),
            )?;
        }
        Commands::Rooms => {
            let client = connect()?;
            render_rows(
                &group_rows(&client.list_rooms()?),
                cli.output,
                &render_opts,
                Some(&["name", "archetype", "children", "id"]),
            )?;
        }
        Commands::Zones => {
            let client = connect()?;
            render_rows(
                &group_rows(&client.list_zones()?),
                cli.output,
                &render_opts,
                Some(&["name", "archetype", "children", "id"]),
            )?;
        }
        Commands::Switches => {
            let client = connect()?;
            let devices = client.list_raw(ResourceType::Device)?;
            let rows: Vec<Value> = devices
                .into_iter()
                .filter(|device| {
                    device
                        .get("services")
                        .and_then(|s| s.as_array())
                        .map(|services| {
                            services.iter().any(|svc| {
                                svc.get("rtype").and_then(|r| r.as_str()) == Some("button")
                            })
                        })
                        .unwrap_or(false)
                })
                .map(|device| {
                    json!({
                        "name": device.pointer("/metadata/name"),
                        "model": device.pointer("/product_data/model_id"),
                        "product": device.pointer("/product_data/product_name"),
                        "id": device.get("id"),
                    })
                })
                .collect();
            render_rows(
                &rows,
                cli.output,
                &render_opts,
                Some(&["name", "model", "product", "id"]),
            )?;
        }
        Commands::Get { resource } => {
            let client = connect()?;
            let rows = client.list_raw(resource.into())?;
            render_rows(&rows, cli.output, &render_opts, None)?;
        }
        Commands::DuplicateScene {
            source_scene,
            new_name,
            turn_on,
            turn_off,
            brightness,
            remove_light,
            zone,
            yes,
        } => {
            let client = connect()?;
            let scenes = client.list_scenes()?;
            let lights = client.list_lights()?;

            let zone_filter = match &zone {
                Some(zone_name) => {
                    let mut groups = client.list_rooms()?;
                    groups.extend(client.list_zones()?);
                    Some(resolve_group(zone_name, &groups, "room/zone")?.id.clone())
                }
                None => None,
            };
            let candidates: Vec<&Scene> = scenes
                .iter()
                .filter(|s| zone_filter.as_deref().is_none_or(|rid| s.group.rid == rid))
                .collect();
            let source = resolve_scene(&source_scene, &candidates)?;

            let specs = edit_specs(&turn_off, &turn_on, &brightness, &remove_light);
            let edit_list = resolve_edits(&specs, &lights).map_err(fail_edits)?;
            let outcome =
                apply_edits(&source.actions, &edit_list, RemovePolicy::Delete).map_err(fail_edits)?;

            println!("Source: {}", source.name());
            println!("New name: {new_name}");
            println!(
                "Group: {} {}…",
                source.group.rtype,
                short_id(&source.group.rid)
            );
            if outcome.applied.is_empty() {
                println!("No modifications specified - creating an exact duplicate");
            } else {
                println!("Modifications:");
                for entry in &outcome.applied {
                    println!("  - {entry}");
                }
            }
            println!("New scene will cover {} lights", outcome.actions.len());

            if !yes && !confirm("Create new scene?")? {
                println!("Cancelled.");
                return Ok(());
            }

            let new_scene =
                NewScene::derived(source, &new_name, source.group.clone(), outcome.actions);
            let new_id = client.create_scene(&new_scene)?;
            println!("Created scene '{new_name}' ({new_id})");
        }
        Commands::ModifyScenes {
            room,
            turn_on,
            turn_off,
            brightness,
            remove_light,
            yes,
        } => {
            let client = connect()?;
            let scenes = client.list_scenes()?;
            let lights = client.list_lights()?;
            let mut groups = client.list_rooms()?;
            groups.extend(client.list_zones()?);
            let group = resolve_group(&room, &groups, "room/zone")?;

            let target_scenes: Vec<Scene> = scenes
                .iter()
                .filter(|s| s.group.rid == group.id)
                .cloned()
                .collect();
            if target_scenes.is_empty() {
                bail!("no scenes found in '{}'", group.metadata.name);
            }

            let specs = edit_specs(&turn_off, &turn_on, &brightness, &remove_light);
            if specs.is_empty() {
                bail!("no modifications specified");
            }
            let edit_list = resolve_edits(&specs, &lights).map_err(fail_edits)?;

            println!("Room/zone: {}", group.metadata.name);
            println!("Scenes to rewrite: {}", target_scenes.len());
            println!("Modifications to apply:");
            for edit in &edit_list {
                println!("  - {}", describe_edit(edit));
            }

            if !yes && !confirm("Proceed with modifications?")? {
                println!("Cancelled.");
                return Ok(());
            }

            let outcome = rewrite_all(&client, &target_scenes, &edit_list);
            println!();
            println!("Modified: {} scenes", outcome.summary.succeeded);
            if outcome.summary.skipped > 0 {
                println!(
                    "Skipped: {} scenes (no matching lights)",
                    outcome.summary.skipped
                );
            }
            if outcome.summary.failed > 0 {
                println!("Failed: {} scenes", outcome.summary.failed);
                for failure in &outcome.failures {
                    println!("  - {}: {}", failure.scene_name, failure.error);
                }
            }
            if outcome.summary.succeeded > 0 {
                println!("Scene names were preserved; switch programmes keep working.");
            }
        }
        Commands::ZoneScene {
            scene,
            zone,
            exclude,
            yes,
        } => {
            let client = connect()?;
            let scenes = client.list_scenes()?;
            let zones = client.list_zones()?;
            let lights = client.list_lights()?;

            let zone_entity = resolve_group(&zone, &zones, "zone")?;
            let refs: Vec<&Scene> = scenes.iter().collect();
            let source = resolve_scene(&scene, &refs)?;

            let zone_lights = zone_light_ids(zone_entity);
            if zone_lights.is_empty() {
                bail!("zone '{}' has no lights", zone_entity.metadata.name);
            }

            let mut excluded: HashSet<String> = HashSet::new();
            for pattern in &exclude {
                let matched = lights_matching(&lights, pattern);
                if matched.is_empty() {
                    let suggestions =
                        similar_names(pattern, lights.iter().map(|l| l.metadata.name.as_str()));
                    if !suggestions.is_empty() {
                        eprintln!("Did you mean: {}?", suggestions.join(", "));
                    }
                    bail!("no light matches '{pattern}'");
                }
                excluded.extend(matched);
            }

            let actions = project_actions(&source.actions, &zone_lights, &excluded);
            let name =
                generate_scene_name(source.name(), &zone_entity.metadata.name, !excluded.is_empty());

            println!("Source: {}", source.name());
            println!(
                "Zone: {} ({} lights, {} excluded)",
                zone_entity.metadata.name,
                zone_lights.len(),
                excluded.len()
            );
            println!("New name: {name}");

            if !yes && !confirm("Create zone scene?")? {
                println!("Cancelled.");
                return Ok(());
            }

            let group = ResourceRef {
                rid: zone_entity.id.clone(),
                rtype: "zone".into(),
            };
            let new_scene = NewScene::derived(source, &name, group, actions);
            let new_id = client.create_scene(&new_scene)?;
            println!("Created scene '{name}' ({new_id})");
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            match shell {
                CompletionShell::Bash => {
                    generate(shells::Bash, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Zsh => {
                    generate(shells::Zsh, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Fish => {
                    generate(shells::Fish, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut std::io::stdout())
                }
            }
        }
    }

    Ok(())
}

/// Edits in the order they are merged: turn-off, turn-on, brightness, remove.
fn edit_specs(
    turn_off: &[String],
    turn_on: &[String],
    brightness: &[String],
    remove_light: &[String],
) -> Vec<EditSpec> {
    let mut specs = Vec::new();
    specs.extend(turn_off.iter().cloned().map(EditSpec::TurnOff));
    specs.extend(turn_on.iter().cloned().map(EditSpec::TurnOn));
    specs.extend(brightness.iter().cloned().map(EditSpec::Brightness));
    specs.extend(remove_light.iter().cloned().map(EditSpec::RemoveLight));
    specs
}

fn describe_edit(edit: &Edit) -> String {
    match &edit.op {
        EditOp::TurnOff => format!("Turn OFF: {}", edit.light_name),
        EditOp::TurnOn => format!("Turn ON: {}", edit.light_name),
        EditOp::Brightness(value) => format!("Set brightness: {} = {value}%", edit.light_name),
        EditOp::Remove => format!("Turn OFF (remove): {}", edit.light_name),
    }
}

fn fail_edits(err: EditError) -> anyhow::Error {
    if let EditError::LightNotFound { suggestions, .. } = &err
        && !suggestions.is_empty()
    {
        eprintln!("Did you mean: {}?", suggestions.join(", "));
    }
    anyhow!(err)
}

fn resolve_group<'a>(
    query: &str,
    groups: &'a [GroupedEntity],
    what: &str,
) -> Result<&'a GroupedEntity> {
    let refs: Vec<&GroupedEntity> = groups.iter().collect();
    match resolve(query, &refs) {
        Resolution::Unique(group) => Ok(group),
        Resolution::Ambiguous(matches) => {
            eprintln!("Multiple {what}s match '{query}':");
            for group in &matches {
                eprintln!("  - {}", group.metadata.name);
            }
            bail!("{what} name '{query}' is ambiguous")
        }
        Resolution::NotFound(suggestions) => {
            if !suggestions.is_empty() {
                eprintln!("Did you mean: {}?", suggestions.join(", "));
            }
            bail!("{what} '{query}' not found")
        }
    }
}

fn resolve_scene<'a>(query: &str, candidates: &[&'a Scene]) -> Result<&'a Scene> {
    match resolve(query, candidates) {
        Resolution::Unique(scene) => Ok(scene),
        Resolution::Ambiguous(matches) => {
            eprintln!("Multiple scenes match '{query}':");
            for scene in &matches {
                let hint = scene.group_hint().unwrap_or("unknown");
                eprintln!("  - {} [{}…]", scene.name(), short_id(hint));
            }
            bail!("scene name '{query}' is ambiguous; use --zone to narrow the search")
        }
        Resolution::NotFound(suggestions) => {
            if !suggestions.is_empty() {
                eprintln!("Did you mean: {}?", suggestions.join(", "));
            }
            bail!("scene '{query}' not found")
        }
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush().context("flushing stdout")?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("reading confirmation")?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn light_rows(lights: &[Light]) -> Vec<Value> {
    lights
        .iter()
        .map(|light| {
            json!({
                "name": light.metadata.name,
                "on": light.on.map(|o| o.on),
                "brightness": light.dimming.map(|d| d.brightness),
                "archetype": light.metadata.archetype,
                "id": light.id,
            })
        })
        .collect()
}

fn group_rows(groups: &[GroupedEntity]) -> Vec<Value> {
    groups
        .iter()
        .map(|group| {
            json!({
                "name": group.metadata.name,
                "archetype": group.metadata.archetype,
                "children": group.children.len(),
                "id": group.id,
            })
        })
        .collect()
}

fn render_rows(
    rows: &[Value],
    output: OutputFormat,
    render_opts: &RenderOpts,
    columns: Option<&[&str]>,
) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(rows)?);
        }
        OutputFormat::Pretty => {
            if !print_table(rows, columns, render_opts) {
                println!("{}", serde_json::to_string_pretty(rows)?);
            }
        }
    }
    Ok(())
}

fn print_table(rows: &[Value], columns_hint: Option<&[&str]>, render_opts: &RenderOpts) -> bool {
    if rows.is_empty() {
        println!("No resources found.");
        return true;
    }

    let first_obj = match &rows[0] {
        Value::Object(map) => map,
        _ => return false,
    };

    let mut columns: Vec<String> = Vec::new();

    if let Some(override_cols) = &render_opts.columns_override {
        for key in override_cols {
            if rows
                .iter()
                .any(|row| row.get(key).map(is_non_empty).unwrap_or(false))
            {
                columns.push(key.to_string());
            }
        }
    }

    if columns.is_empty()
        && let Some(hint) = columns_hint
    {
        for key in hint {
            if rows
                .iter()
                .any(|row| row.get(key).map(is_non_empty).unwrap_or(false))
            {
                columns.push((*key).to_string());
            }
        }
    }

    if columns.is_empty() {
        // Auto-select up to 8 fields present in the first object.
        for key in first_obj.keys() {
            if rows
                .iter()
                .any(|row| row.get(key).map(is_non_empty).unwrap_or(false))
            {
                columns.push(key.to_string());
            }
            if columns.len() >= 8 {
                break;
            }
        }
    }

    // Always include id if present and not already included.
    if !columns.contains(&"id".to_string())
        && rows
            .iter()
            .any(|row| row.get("id").map(is_non_empty).unwrap_or(false))
    {
        columns.push("id".to_string());
    }

    if columns.is_empty() {
        return false;
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    let mut table: Vec<Vec<String>> = Vec::new();
    let needle = render_opts.filter.as_ref().map(|f| f.to_ascii_lowercase());

    for row in rows {
        if let Value::Object(map) = row {
            let mut out_row = Vec::new();
            for col in columns.iter() {
                let value = map.get(col).unwrap_or(&Value::Null);
                let mut rendered = value_to_str(value);
                if col == "id" && !*FULL_IDS.get().unwrap_or(&false) && rendered.len() > 12 {
                    rendered = format!("{}…", rendered.chars().take(12).collect::<String>());
                }
                out_row.push(rendered);
            }
            if let Some(needle) = &needle
                && !out_row
                    .iter()
                    .any(|cell| cell.to_ascii_lowercase().contains(needle))
            {
                continue;
            }
            for (idx, cell) in out_row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.len());
            }
            table.push(out_row);
        }
    }

    if table.is_empty() {
        println!("No resources found.");
        return true;
    }

    if let Some(sort) = &render_opts.sort_by
        && let Some(idx) = columns.iter().position(|c| c == sort)
    {
        table.sort_by(|a, b| a[idx].cmp(&b[idx]));
    }

    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            print!("  ");
        }
        print!("{:width$}", col, width = widths[i]);
    }
    println!();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            print!("  ");
        }
        print!("{:-<width$}", "", width = *width);
    }
    println!();
    for row in table {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                print!("  ");
            }
            print!("{:width$}", cell, width = widths[i]);
        }
        println!();
    }

    true
}

fn value_to_str(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) => true,
        Value::Number(_) => true,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
