use std::{collections::HashMap, sync::Arc, thread};

use crossbeam_channel::Sender;
use serde::Deserialize;
use url::Url;

use crate::{
    category::Category,
    enforce,
    error::Error,
    item::{ContentKind, Details, GameDetails, Item, UNKNOWN_GENRE, UNKNOWN_YEAR},
    item_id::ItemId,
    store::Enrichment,
    util::{default_agent, via_cors_proxy},
};

use super::wiki::extract_year;

const OWNED_GAMES_URL: &str = "https://api.steampowered.com/IPlayerService/GetOwnedGames/v0001/";
const APP_DETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";

/// A game from the user's Steam library, not yet part of the collection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SteamGame {
    pub appid: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "playtime_forever")]
    pub playtime_minutes: u32,
}

impl SteamGame {
    /// Converts into an uncategorized game with placeholder genre and year,
    /// to be filled in by enrichment once placed.
    pub fn into_item(self) -> Item {
        let title = if self.name.trim().is_empty() {
            format!("App {}", self.appid)
        } else {
            self.name
        };
        let mut item = Item::new(ContentKind::Game, title, UNKNOWN_YEAR, Category::Limbo)
            .with_genres([UNKNOWN_GENRE]);
        item.details = Details::Game(GameDetails {
            steam_app_id: Some(self.appid),
            playtime_minutes: Some(self.playtime_minutes),
        });
        enforce::normalize_on_category_change(item, Category::Limbo)
    }
}

pub struct SteamClient {
    agent: ureq::Agent,
    api_key: String,
    steam_id: String,
    cors_proxy: Option<String>,
}

impl SteamClient {
    pub fn new(
        api_key: String,
        steam_id: String,
        cors_proxy: Option<String>,
        proxy_url: Option<&str>,
    ) -> Self {
        Self {
            agent: default_agent(proxy_url),
            api_key,
            steam_id,
            cors_proxy,
        }
    }

    /// Every game in the library, most played first.
    pub fn owned_games(&self) -> Result<Vec<SteamGame>, Error> {
        #[derive(Deserialize)]
        struct Envelope {
            response: OwnedGames,
        }

        #[derive(Deserialize)]
        struct OwnedGames {
            #[serde(default)]
            games: Vec<SteamGame>,
        }

        let mut url = parse_url(OWNED_GAMES_URL)?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("steamid", &self.steam_id)
            .append_pair("include_appinfo", "1")
            .append_pair("format", "json");

        let envelope: Envelope = self
            .agent
            .get(self.proxied(url.as_str()))
            .call()?
            .body_mut()
            .read_json()?;
        let mut games = envelope.response.games;
        games.sort_by(|a, b| b.playtime_minutes.cmp(&a.playtime_minutes));
        log::info!("loaded {} owned games", games.len());
        Ok(games)
    }

    /// Genres and release year from the store page of `appid`.
    pub fn app_details(&self, appid: u32) -> Result<Enrichment, Error> {
        let mut url = parse_url(APP_DETAILS_URL)?;
        url.query_pairs_mut().append_pair("appids", &appid.to_string());

        let body: HashMap<String, AppDetails> = self
            .agent
            .get(self.proxied(url.as_str()))
            .call()?
            .body_mut()
            .read_json()?;
        Ok(body
            .into_values()
            .next()
            .and_then(|details| details.data)
            .map(AppData::into_enrichment)
            .unwrap_or_default())
    }

    fn proxied(&self, url: &str) -> String {
        via_cors_proxy(self.cors_proxy.as_deref(), url)
    }
}

fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|err| Error::NetworkError(Box::new(err)))
}

#[derive(Deserialize)]
struct AppDetails {
    #[serde(default)]
    data: Option<AppData>,
}

#[derive(Deserialize)]
struct AppData {
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    release_date: Option<ReleaseDate>,
}

#[derive(Deserialize)]
struct Genre {
    description: String,
}

#[derive(Deserialize)]
struct ReleaseDate {
    #[serde(default)]
    date: String,
}

impl AppData {
    fn into_enrichment(self) -> Enrichment {
        let genres: Vec<String> = self.genres.into_iter().map(|g| g.description).collect();
        Enrichment {
            genres: (!genres.is_empty()).then_some(genres),
            year: self.release_date.and_then(|r| extract_year(&r.date)),
        }
    }
}

/// Looks up `appid` on a worker thread and reports back on `sender`.  The
/// receiver is expected to commit the result as `Action::Enrich`, which
/// ignores it if the item is gone or was edited meanwhile.
pub fn spawn_enrichment(
    client: Arc<SteamClient>,
    id: ItemId,
    appid: u32,
    sender: Sender<(ItemId, Result<Enrichment, Error>)>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let result = client.app_details(appid);
        if let Err(err) = &result {
            log::warn!("enrichment of app {appid} failed: {err}");
        }
        if sender.send((id, result)).is_err() {
            log::debug!("enrichment receiver gone");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_uncategorized_placeholder() {
        let game = SteamGame {
            appid: 1145360,
            name: "Hades".into(),
            playtime_minutes: 3000,
        };
        let item = game.into_item();
        assert_eq!(item.category, Category::Limbo);
        assert!(item.has_unknown_genre());
        assert!(item.has_unknown_year());
        assert_eq!(item.tag, None);
        assert_eq!(
            item.details,
            Details::Game(GameDetails {
                steam_app_id: Some(1145360),
                playtime_minutes: Some(3000),
            })
        );
    }

    #[test]
    fn parses_owned_games_payload() {
        let json = r#"{"appid": 620, "name": "Portal 2", "playtime_forever": 42}"#;
        let game: SteamGame = serde_json::from_str(json).unwrap();
        assert_eq!(game.appid, 620);
        assert_eq!(game.playtime_minutes, 42);
    }

    #[test]
    fn parses_app_details_payload() {
        let json = r#"{"620": {"success": true, "data": {
            "genres": [
                {"id": "1", "description": "Action"},
                {"id": "25", "description": "Adventure"}
            ],
            "release_date": {"coming_soon": false, "date": "18 Apr, 2011"}
        }}}"#;
        let body: HashMap<String, AppDetails> = serde_json::from_str(json).unwrap();
        let enrichment = body
            .into_values()
            .next()
            .and_then(|d| d.data)
            .map(AppData::into_enrichment)
            .unwrap();
        assert_eq!(enrichment.genres.unwrap(), ["Action", "Adventure"]);
        assert_eq!(enrichment.year, Some(2011));
    }

    #[test]
    fn failed_lookup_has_no_data() {
        let body: HashMap<String, AppDetails> =
            serde_json::from_str(r#"{"1": {"success": false}}"#).unwrap();
        assert!(body.into_values().next().unwrap().data.is_none());
    }
}
