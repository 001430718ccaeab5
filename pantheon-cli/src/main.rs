use std::{
    env, fmt,
    path::PathBuf,
    process,
    sync::Arc,
    time::{Duration, Instant},
};

use env_logger::{Builder, Env};
use itertools::Itertools;
use url::Url;

use pantheon_core::{
    config::Config,
    drag::{DragSession, DragSource, DropZone},
    enforce,
    lookup::{steam, SteamGame, Suggester, WikiClient},
    position::Rect,
    share::{self, SharedLink},
    store::Action,
    transfer, Category, ContentKind, Error, FigureId, Item, ItemId, Library,
};

const ENV_LOG: &str = "PANTHEON_LOG";
const ENV_LOG_STYLE: &str = "PANTHEON_LOG_STYLE";

const ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(15);
const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(10);

const USAGE: &str = "\
usage: pantheon [--kind games|movies|tvshows] <command> [args]

commands:
  list                              show the collection by category
  add <title> <year> [category] [genres]
  move <id> <category>              move to the end of a category
  drop <id> <target-id> before|after
  drop <id> <category>              drag onto a category
  tag <id> <figure>|none
  delete <id>
  figures [id]                      figures available for an item
  share [title]                     print a share link
  open <url>                        show a shared collection
  import <file>                     replace the collection from JSON
  export <file>
  history                           list saved snapshots
  reset                             restore the built-in collection
  steam                             list owned Steam games
  steam add <appid> <category>      place a Steam game and look it up
  suggest <text>                    title suggestions
  info <title>                      page summary with release year";

enum CliError {
    Usage(String),
    Core(Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{msg}\n\n{USAGE}"),
            Self::Core(err) => err.fmt(f),
        }
    }
}

impl From<Error> for CliError {
    fn from(err: Error) -> Self {
        CliError::Core(err)
    }
}

fn usage(msg: impl Into<String>) -> CliError {
    CliError::Usage(msg.into())
}

fn main() {
    // Setup logging from the env variables, with defaults.
    Builder::from_env(
        Env::new()
            .filter_or(ENV_LOG, "info")
            .write_style(ENV_LOG_STYLE),
    )
    .init();

    let config = Config::load().unwrap_or_default();
    let args: Vec<String> = env::args().skip(1).collect();

    if let Err(err) = run(&config, args) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(config: &Config, args: Vec<String>) -> Result<(), CliError> {
    let (kind, args) = split_kind(args)?;
    let Some((command, args)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let mut library = Library::open(config.persistence()?);
    library.set_current_kind(kind);

    match (command.as_str(), args) {
        ("list", []) => print_collection(library.items()),
        ("add", [title, year, rest @ ..]) => add(&mut library, title, year, rest)?,
        ("move", [id, category]) => {
            let id = resolve(library.items(), id)?;
            let category = category.parse()?;
            print_collection(library.dispatch(Action::MoveCategory { id, category })?);
        }
        ("drop", [id, target, position]) => drop_on_item(&mut library, id, target, position)?,
        ("drop", [id, category]) => drop_on_category(&mut library, id, category)?,
        ("tag", [id, figure]) => tag(&mut library, id, figure)?,
        ("delete", [id]) => {
            let id = resolve(library.items(), id)?;
            print_collection(library.dispatch(Action::Delete(id))?);
        }
        ("figures", []) => print_figures(Category::TAGGED.iter().copied(), library.items(), None),
        ("figures", [id]) => {
            let id = resolve(library.items(), id)?;
            let category = library.get(&id).map(|it| it.category).unwrap_or_default();
            print_figures([category].into_iter(), library.items(), Some(&id));
        }
        ("share", rest) => share(config, &library, rest.first().cloned())?,
        ("open", [url]) => open(&mut library, url)?,
        ("import", [path]) => {
            let items = transfer::import_file(kind, &PathBuf::from(path))?;
            print_collection(library.dispatch(Action::Set(items))?);
        }
        ("export", [path]) => transfer::export_to_file(library.items(), &PathBuf::from(path))?,
        ("history", []) => history(&library, kind),
        ("reset", []) => print_collection(library.reset()?),
        ("steam", []) => list_steam(config)?,
        ("steam", [sub, appid, category]) if sub == "add" => {
            steam_add(config, &mut library, appid, category)?
        }
        ("suggest", words) if !words.is_empty() => suggest(config, &words.join(" "))?,
        ("info", words) if !words.is_empty() => info(config, &words.join(" "))?,
        (other, _) => return Err(usage(format!("bad arguments for {other:?}"))),
    }
    Ok(())
}

fn split_kind(args: Vec<String>) -> Result<(ContentKind, Vec<String>), CliError> {
    let mut kind = ContentKind::default();
    let mut rest = Vec::with_capacity(args.len());
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--kind" {
            let value = args.next().ok_or_else(|| usage("--kind needs a value"))?;
            kind = value.parse()?;
        } else if let Some(value) = arg.strip_prefix("--kind=") {
            kind = value.parse()?;
        } else {
            rest.push(arg);
        }
    }
    Ok((kind, rest))
}

/// Finds the single item whose id starts with `prefix`.
fn resolve(items: &[Item], prefix: &str) -> Result<ItemId, CliError> {
    let mut matches = items.iter().filter(|it| it.id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(item.id.clone()),
        (Some(_), Some(_)) => Err(usage(format!("ambiguous id {prefix:?}"))),
        (None, _) => Err(Error::ItemNotFound(prefix.to_string()).into()),
    }
}

fn print_collection(items: &[Item]) {
    for category in Category::ALL {
        let members: Vec<&Item> = items.iter().filter(|it| it.category == category).collect();
        println!("{} ({})", category.label(), members.len());
        for item in members {
            let mut line = format!("  {}  {}", item.id.prefix(share::ID_PREFIX_LEN), item.title);
            if !item.has_unknown_year() {
                line.push_str(&format!(" ({})", item.year));
            }
            if !item.genres.is_empty() {
                line.push_str(&format!(" [{}]", item.genre_names()));
            }
            if let Some(figure) = item.tag.as_ref().and_then(FigureId::figure) {
                line.push_str(&format!(" <{}>", figure.name));
            }
            if let Some(summary) = item.details.summary() {
                line.push_str(&format!(" {{{summary}}}"));
            }
            println!("{line}");
        }
    }
}

fn add(library: &mut Library, title: &str, year: &str, rest: &[String]) -> Result<(), CliError> {
    let year = year
        .parse()
        .map_err(|_| usage(format!("year must be a number, got {year:?}")))?;
    let category = match rest.first() {
        Some(category) => category.parse()?,
        None => Category::default(),
    };
    let genres = rest
        .get(1)
        .map(|g| g.split(',').map(str::trim).filter(|g| !g.is_empty()).collect_vec())
        .unwrap_or_default();
    let item = Item::new(library.current_kind(), title, year, category).with_genres(genres);
    print_collection(library.dispatch(Action::Add(item))?);
    Ok(())
}

// The CLI has no pointer, so a fixed row is used and the pointer is put on
// the half that gives the requested side.
const ROW: Rect = Rect {
    left: 0.0,
    top: 0.0,
    width: 100.0,
    height: 40.0,
};

fn drop_on_item(
    library: &mut Library,
    id: &str,
    target: &str,
    position: &str,
) -> Result<(), CliError> {
    let id = resolve(library.items(), id)?;
    let target = resolve(library.items(), target)?;
    let pointer_y = match position {
        "before" => ROW.top,
        "after" => ROW.top + ROW.height,
        other => return Err(usage(format!("expected before or after, got {other:?}"))),
    };
    let zone = library
        .get(&target)
        .map(DropZone::for_item)
        .ok_or_else(|| Error::ItemNotFound(target.to_string()))?;

    let mut session = DragSession::new();
    session.start(DragSource::Existing(id));
    session.over(zone.clone(), pointer_y, &ROW);
    commit_drop(library, &mut session, &zone)
}

fn drop_on_category(library: &mut Library, id: &str, category: &str) -> Result<(), CliError> {
    let id = resolve(library.items(), id)?;
    let zone = DropZone::Category(category.parse()?);
    let mut session = DragSession::new();
    session.start(DragSource::Existing(id));
    session.over(zone.clone(), ROW.mid_y(), &ROW);
    commit_drop(library, &mut session, &zone)
}

fn commit_drop(
    library: &mut Library,
    session: &mut DragSession,
    zone: &DropZone,
) -> Result<(), CliError> {
    match session.drop(library.items(), zone) {
        Some(outcome) => print_collection(library.dispatch(outcome.into_action())?),
        None => println!("nothing to move"),
    }
    Ok(())
}

fn tag(library: &mut Library, id: &str, figure: &str) -> Result<(), CliError> {
    let id = resolve(library.items(), id)?;
    let tag = match figure {
        "none" | "-" => None,
        figure => {
            let tag = FigureId::new(figure.to_ascii_lowercase());
            let figure = tag.figure().ok_or_else(|| Error::UnknownFigure(figure.to_string()))?;
            let category = library.get(&id).map(|it| it.category).unwrap_or_default();
            if figure.tier != category {
                return Err(usage(format!(
                    "{} belongs to {}, the item is in {}",
                    figure.name,
                    figure.tier.label(),
                    category.label()
                )));
            }
            if enforce::used_tags(library.items(), Some(&id)).contains(&tag) {
                log::warn!("{} is already used by another item", figure.name);
            }
            Some(tag)
        }
    };
    print_collection(library.dispatch(Action::SetTag { id, tag })?);
    Ok(())
}

fn print_figures(
    categories: impl Iterator<Item = Category>,
    items: &[Item],
    exclude: Option<&ItemId>,
) {
    for category in categories {
        if !category.is_taggable() {
            println!("{} items take no figure", category.label());
            continue;
        }
        println!("{}", category.label());
        for choice in enforce::available_figures(category, items, exclude) {
            let taken = if choice.taken { " (taken)" } else { "" };
            println!(
                "  {:<12} {}, {}{}",
                choice.figure.id, choice.figure.name, choice.figure.domain, taken
            );
        }
    }
}

fn share(config: &Config, library: &Library, title: Option<String>) -> Result<(), CliError> {
    let encoded = share::encode(library.items())?;
    let link = SharedLink {
        payload: encoded.payload,
        kind: library.current_kind(),
        title,
    };
    println!("{}", link.to_url(&config.share_base()?));
    println!(
        "{} bytes of JSON in {} characters ({:.0}% smaller)",
        encoded.stats.raw_len,
        encoded.stats.compressed_len,
        encoded.stats.reduction_percent()
    );
    Ok(())
}

fn open(library: &mut Library, url: &str) -> Result<(), CliError> {
    let url = Url::parse(url).map_err(|err| Error::InvalidShare(err.to_string()))?;
    let link = SharedLink::from_url(&url)
        .ok_or_else(|| Error::InvalidShare("no shared collection in URL".into()))?;
    let view = library.enter_shared(&link);
    match &view.title {
        Some(title) => println!("{title} (shared {})", view.kind.label()),
        None => println!("shared {}", view.kind.label()),
    }
    if view.items.is_empty() {
        println!("the link holds no readable collection");
    }
    print_collection(library.items());
    library.leave_shared();
    Ok(())
}

fn history(library: &Library, kind: ContentKind) {
    let snapshots = library.persistence().history(kind);
    if snapshots.is_empty() {
        println!("no history");
    }
    for snapshot in snapshots.iter().rev() {
        let when = time::OffsetDateTime::from_unix_timestamp(snapshot.timestamp)
            .map(|t| t.to_string())
            .unwrap_or_else(|_| snapshot.timestamp.to_string());
        println!("{when}  {} items", snapshot.items.len());
    }
}

fn steam_client(config: &Config) -> Result<steam::SteamClient, CliError> {
    config
        .steam_client()
        .ok_or_else(|| usage("set steam_api_key and steam_id in the config first"))
}

fn list_steam(config: &Config) -> Result<(), CliError> {
    for game in steam_client(config)?.owned_games()? {
        println!("{:>8}  {} ({}h)", game.appid, game.name, game.playtime_minutes / 60);
    }
    Ok(())
}

fn steam_add(
    config: &Config,
    library: &mut Library,
    appid: &str,
    category: &str,
) -> Result<(), CliError> {
    if library.current_kind() != ContentKind::Game {
        return Err(usage("Steam games go into the games collection"));
    }
    let appid: u32 = appid
        .parse()
        .map_err(|_| usage(format!("bad app id {appid:?}")))?;
    let zone = DropZone::Category(category.parse()?);
    let client = Arc::new(steam_client(config)?);
    let game = client
        .owned_games()?
        .into_iter()
        .find(|game| game.appid == appid)
        .unwrap_or(SteamGame {
            appid,
            name: String::new(),
            playtime_minutes: 0,
        });

    let mut session = DragSession::new();
    session.start(DragSource::Pending(Box::new(game.into_item())));
    let Some(outcome) = session.drop(library.items(), &zone) else {
        return Ok(());
    };
    let target = outcome.enrichment_target();
    let id = outcome.item.clone();
    library.dispatch(outcome.into_action())?;

    if let Some(appid) = target {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let _worker = steam::spawn_enrichment(client, id, appid, sender);
        match receiver.recv_timeout(ENRICHMENT_TIMEOUT) {
            Ok((id, Ok(enrichment))) => {
                library.dispatch(Action::Enrich { id, enrichment })?;
            }
            Ok((_, Err(err))) => log::warn!("keeping placeholders: {err}"),
            Err(_) => log::warn!("lookup timed out, keeping placeholders"),
        }
    }
    print_collection(library.items());
    Ok(())
}

fn suggest(config: &Config, text: &str) -> Result<(), CliError> {
    let source = Arc::new(WikiClient::new(config.proxy().as_deref()));
    let mut suggester = Suggester::new(source, config.suggestion_cache(), config.debounce());
    suggester.input(text, Instant::now());
    match suggester.settle(SUGGESTION_TIMEOUT).resolved() {
        Some(titles) if titles.is_empty() => println!("no suggestions"),
        Some(titles) => titles.iter().for_each(|title| println!("{title}")),
        None => println!("no suggestions"),
    }
    Ok(())
}

fn info(config: &Config, title: &str) -> Result<(), CliError> {
    let page = WikiClient::new(config.proxy().as_deref()).summary(title)?;
    println!("{}", page.title);
    if let Some(description) = &page.description {
        println!("{description}");
    }
    if let Some(year) = page.year {
        println!("year: {year}");
    }
    println!("\n{}", page.extract);
    Ok(())
}
