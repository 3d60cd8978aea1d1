use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::Deserialize;

use lotto_db::models::Draw;
use lotto_db::source::DrawSource;

use crate::retry::{retry, RetryConfig};

pub const ROUND_API_URL: &str = "https://www.dhlottery.co.kr/common.do?method=getLottoNumber&drwNo=";
pub const MAIN_PAGE_URL: &str = "https://dhlottery.co.kr/common.do?method=main";
const LATEST_ROUND_SELECTOR: &str = "strong#lottoDrwNo";

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Préfixe de l'API, le numéro de tirage est ajouté à la fin
    pub round_api_url: String,
    pub main_page_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            round_api_url: ROUND_API_URL.to_string(),
            main_page_url: MAIN_PAGE_URL.to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }
}

impl SourceConfig {
    pub fn round_url(&self, round: u32) -> String {
        format!("{}{}", self.round_api_url, round)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoundResponse {
    return_value: String,
    drw_no: Option<u32>,
    drw_no_date: Option<String>,
    drwt_no1: Option<u8>,
    drwt_no2: Option<u8>,
    drwt_no3: Option<u8>,
    drwt_no4: Option<u8>,
    drwt_no5: Option<u8>,
    drwt_no6: Option<u8>,
}

/// Décode la réponse JSON de l'API pour un tirage.
pub fn parse_round_response(body: &str, round: u32) -> Result<Draw> {
    let response: RoundResponse =
        serde_json::from_str(body).with_context(|| format!("Réponse JSON invalide pour le tirage {}", round))?;

    if response.return_value != "success" {
        bail!("Tirage {} : returnValue = '{}'", round, response.return_value);
    }

    let field = |value: Option<u8>, idx: usize| -> Result<u8> {
        value.with_context(|| format!("Champ drwtNo{} manquant (tirage {})", idx, round))
    };

    let numbers = [
        field(response.drwt_no1, 1)?,
        field(response.drwt_no2, 2)?,
        field(response.drwt_no3, 3)?,
        field(response.drwt_no4, 4)?,
        field(response.drwt_no5, 5)?,
        field(response.drwt_no6, 6)?,
    ];
    let date = response
        .drw_no_date
        .with_context(|| format!("Champ drwNoDate manquant (tirage {})", round))?;

    Ok(Draw {
        round: response.drw_no.unwrap_or(round),
        numbers,
        date,
    })
}

/// Extrait le dernier numéro de tirage de la page d'accueil.
pub fn parse_latest_round(html: &str) -> Result<u32> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(LATEST_ROUND_SELECTOR).map_err(|e| anyhow!("Sélecteur invalide: {}", e))?;

    let elem = document
        .select(&selector)
        .next()
        .context("Élément lottoDrwNo introuvable")?;
    let text = elem.text().collect::<String>();
    let text = text.trim();
    text.parse::<u32>()
        .with_context(|| format!("Numéro de tirage illisible: '{}'", text))
}

/// Source HTTP officielle (dhlottery.co.kr).
pub struct DhLotterySource {
    client: Client,
    config: SourceConfig,
}

impl DhLotterySource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lotto645/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Impossible de créer le client HTTP")?;
        Ok(Self { client, config })
    }

    fn get_text(&self, url: &str) -> Result<String> {
        retry(&self.config.retry, url, || {
            log::debug!("GET {}", url);
            let response = self
                .client
                .get(url)
                .send()
                .with_context(|| format!("Requête échouée: {}", url))?
                .error_for_status()
                .with_context(|| format!("Statut HTTP en erreur: {}", url))?;
            response.text().context("Corps de réponse illisible")
        })
    }
}

impl DrawSource for DhLotterySource {
    fn latest_round(&self) -> Option<u32> {
        match self
            .get_text(&self.config.main_page_url)
            .and_then(|html| parse_latest_round(&html))
        {
            Ok(round) => Some(round),
            Err(e) => {
                log::warn!("Récupération du dernier tirage impossible : {:#}", e);
                None
            }
        }
    }

    fn fetch_round(&self, round: u32) -> Option<Draw> {
        match self
            .get_text(&self.config.round_url(round))
            .and_then(|body| parse_round_response(&body, round))
        {
            Ok(draw) => Some(draw),
            Err(e) => {
                log::warn!("Tirage {} : {:#}", round, e);
                None
            }
        }
    }
}

/// Affiche une barre de progression pendant le rattrapage des tirages.
pub struct ProgressSource<S> {
    inner: S,
    last_saved: u32,
    bar: ProgressBar,
}

impl<S: DrawSource> ProgressSource<S> {
    pub fn new(inner: S, last_saved: u32) -> Self {
        Self {
            inner,
            last_saved,
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl<S: DrawSource> DrawSource for ProgressSource<S> {
    fn latest_round(&self) -> Option<u32> {
        let latest = self.inner.latest_round()?;
        if latest > self.last_saved {
            self.bar.set_length(u64::from(latest - self.last_saved));
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                self.bar.set_style(style.progress_chars("=> "));
            }
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
        }
        Some(latest)
    }

    fn fetch_round(&self, round: u32) -> Option<Draw> {
        self.bar.set_message(format!("tirage {}", round));
        let draw = self.inner.fetch_round(round);
        self.bar.inc(1);
        draw
    }
}
