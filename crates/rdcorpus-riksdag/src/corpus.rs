//! Corpus Dispatcher: archive name prefix → corpus id, name and description

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::UnknownCorpus;

/// `<prefix>-<year>-<rest>`
static ARCHIVE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)-\d{4}-.+").expect("valid regex"));

/// Target corpus of one archive prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CorpusInfo {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            description: description.to_owned(),
        }
    }
}

/// Ordered prefix table, passed explicitly to whoever routes archives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusTable {
    entries: Vec<(String, CorpusInfo)>,
}

/// Where one archive's documents go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRoute<'a> {
    pub prefix: String,
    pub corpus: &'a CorpusInfo,
    /// Archive name without its last two extensions
    pub subdir: String,
}

impl CorpusTable {
    /// Document series published as Riksdagens öppna data.
    pub fn riksdagen() -> Self {
        let mut table = Self::default();
        for (prefix, id, name, description) in RIKSDAGEN {
            table.insert(*prefix, CorpusInfo::new(id, name, description));
        }
        table
    }

    /// Add a prefix, replacing an existing entry in place.
    pub fn insert(&mut self, prefix: impl Into<String>, info: CorpusInfo) {
        let prefix = prefix.into();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, existing)) => *existing = info,
            None => self.entries.push((prefix, info)),
        }
    }

    pub fn lookup(&self, prefix: &str) -> Result<&CorpusInfo, UnknownCorpus> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, info)| info)
            .ok_or_else(|| UnknownCorpus(prefix.to_owned()))
    }

    /// Corpus and output sub-directory for an archive file name.
    ///
    /// Names that do not look like `<prefix>-<year>-<rest>` are unknown too.
    pub fn resolve_archive(&self, archive_name: &str) -> Result<ArchiveRoute<'_>, UnknownCorpus> {
        let prefix =
            archive_prefix(archive_name).ok_or_else(|| UnknownCorpus(archive_name.to_owned()))?;
        let corpus = self.lookup(prefix)?;
        Ok(ArchiveRoute {
            prefix: prefix.to_owned(),
            corpus,
            subdir: archive_subdir(archive_name),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CorpusInfo)> {
        self.entries.iter().map(|(p, info)| (p.as_str(), info))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Corpus prefix of an archive file name.
pub fn archive_prefix(archive_name: &str) -> Option<&str> {
    ARCHIVE_NAME
        .captures(archive_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// `bet-2018-2021.xml.zip` → `bet-2018-2021`
pub fn archive_subdir(archive_name: &str) -> String {
    let once = Path::new(archive_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_name.to_owned());
    Path::new(&once)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(once)
}

/// (prefix, id, name, description)
const RIKSDAGEN: &[(&str, &str, &str, &str)] = &[
    (
        "bet",
        "rd-bet",
        "Betänkande",
        "Utskottens betänkanden och utlåtanden, inklusive riksdagens beslut, en sammanfattning av voteringsresultaten och Beslut i korthet",
    ),
    (
        "ds",
        "rd-ds",
        "Departementsserien",
        "Utredningar från regeringens departement",
    ),
    (
        "EUN",
        "rd-eun",
        "EUN",
        "Dokument från EU-nämnden, bland annat möteskallelser, föredragningslistor, protokoll och skriftliga samråd med regeringen",
    ),
    (
        "f-lista",
        "rd-flista",
        "Föredragningslista",
        "Föredragningslistor för kammarens sammanträden",
    ),
    (
        "fpm",
        "rd-fpm",
        "Faktapromemoria",
        "Regeringens faktapromemorior om EU-kommissionens förslag",
    ),
    (
        "frsrdg",
        "rd-frsrdg",
        "Framställning/redogörelse",
        "Framställningar och redogörelser från organ som utsetts av riksdagen",
    ),
    (
        "ip",
        "rd-ip",
        "Interpellation",
        "Interpellationer från ledamöterna till regeringen",
    ),
    ("kammakt", "rd-kammakt", "Kammaraktiviteter", ""),
    (
        "kom",
        "rd-kom",
        "KOM",
        "EU-kommissionens förslag och redogörelser, så kallade KOM-dokument",
    ),
    (
        "mot",
        "rd-mot",
        "Motion",
        "Motioner från riksdagens ledamöter",
    ),
    (
        "prop",
        "rd-prop",
        "Proposition",
        "Propositioner och skrivelser från regeringen",
    ),
    (
        "prot",
        "rd-prot",
        "Protokoll",
        "Protokoll från kammarens sammanträden",
    ),
    (
        "rskr",
        "rd-rskr",
        "Riksdagsskrivelse",
        "Skrivelser från riksdagen till regeringen",
    ),
    ("samtr", "rd-samtr", "Sammanträden", ""),
    (
        "Skriftliga+frågor",
        "rd-skfr",
        "Skriftliga frågor",
        "Skriftliga frågor från ledamöterna till regeringen och svaren på dessa",
    ),
    (
        "sou",
        "rd-sou",
        "Statens offentliga utredningar",
        "Olika utredningars förslag till regeringen",
    ),
    (
        "t-lista",
        "rd-tlista",
        "Talarlista",
        "Talarlistor för kammarens sammanträden",
    ),
    (
        "Utredningar",
        "rd-utr",
        "Utredningar",
        "Kommittédirektiv och kommittéberättelser för utredningar som regeringen tillsätter",
    ),
    (
        "utskottsdokument",
        "rd-utsk",
        "Utskottsdokument",
        "Dokument från utskotten, bland annat KU-anmälningar, protokoll, verksamhetsberättelser och den gamla dokumentserien Utredningar från riksdagen",
    ),
    (
        "yttr",
        "rd-yttr",
        "Yttrande",
        "Utskottens yttranden",
    ),
    (
        "Övrigt",
        "rd-ovr",
        "Övrigt",
        "Dokumentserierna Riksrevisionens granskningsrapporter, Utredningar från Riksdagsförvaltningen och Rapporter från riksdagen samt planeringsdokument, bilagor till dokument och uttag ur riksdagens databaser",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_from_archive_name() {
        assert_eq!(archive_prefix("bet-2018-2021.xml.zip"), Some("bet"));
        assert_eq!(archive_prefix("f-lista-2010-2013.xml.zip"), Some("f-lista"));
        assert_eq!(
            archive_prefix("Skriftliga+frågor-1990-1997.xml.zip"),
            Some("Skriftliga+frågor")
        );
        assert_eq!(archive_prefix("readme.zip"), None);
    }

    #[test]
    fn subdir_drops_two_extensions() {
        assert_eq!(archive_subdir("bet-2018-2021.xml.zip"), "bet-2018-2021");
        assert_eq!(archive_subdir("mot-2018-2021.zip"), "mot-2018-2021");
    }

    #[test]
    fn resolves_known_archive() {
        let table = CorpusTable::riksdagen();
        let route = table.resolve_archive("prot-2020-2021.xml.zip").unwrap();
        assert_eq!(route.prefix, "prot");
        assert_eq!(route.corpus.id, "rd-prot");
        assert_eq!(route.subdir, "prot-2020-2021");
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        let table = CorpusTable::riksdagen();
        assert_eq!(
            table.resolve_archive("nytt-2020-2021.xml.zip").unwrap_err(),
            UnknownCorpus("nytt".into())
        );
        assert!(table.resolve_archive("nonsense.zip").is_err());
    }

    #[test]
    fn insert_overrides_in_place() {
        let mut table = CorpusTable::riksdagen();
        let before = table.len();
        table.insert("bet", CorpusInfo::new("rd-bet2", "Betänkanden", ""));
        table.insert("nytt", CorpusInfo::new("rd-nytt", "Nytt", "Ny serie"));
        assert_eq!(table.len(), before + 1);
        assert_eq!(table.lookup("bet").unwrap().id, "rd-bet2");
        assert_eq!(table.iter().next().map(|(p, _)| p), Some("bet"));
    }

    #[test]
    fn builtin_table_has_unique_ids() {
        let table = CorpusTable::riksdagen();
        let mut ids: Vec<&str> = table.iter().map(|(_, c)| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), table.len());
    }
}
