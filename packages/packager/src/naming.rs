use rand::Rng;
use rand::seq::IndexedRandom;

const ADJECTIVES: &[&str] = &[
    "admiring", "agitated", "amazing", "blissful", "bold", "brave", "busy", "charming",
    "clever", "compassionate", "confident", "cranky", "dazzling", "determined", "eager",
    "ecstatic", "elastic", "elated", "epic", "festive", "focused", "friendly", "gallant",
    "gifted", "goofy", "gracious", "happy", "hopeful", "infallible", "jolly", "keen",
    "kind", "laughing", "loving", "lucid", "magical", "modest", "nervous", "nifty",
    "nostalgic", "optimistic", "peaceful", "pensive", "practical", "quirky", "relaxed",
    "romantic", "serene", "sharp", "silly", "stoic", "sweet", "tender", "trusting",
    "upbeat", "vibrant", "vigilant", "wizardly", "wonderful", "youthful", "zealous",
];

const SURNAMES: &[&str] = &[
    "babbage", "bardeen", "bell", "bohr", "boole", "curie", "darwin", "dijkstra",
    "einstein", "euclid", "euler", "faraday", "fermat", "fermi", "feynman", "galileo",
    "gauss", "goldwasser", "hamilton", "hawking", "hopper", "hypatia", "kepler", "knuth",
    "lamarr", "lamport", "liskov", "lovelace", "maxwell", "mendel", "newton", "noether",
    "pascal", "pasteur", "perlman", "planck", "ramanujan", "ritchie", "shannon", "sinoussi",
    "tesla", "thompson", "torvalds", "turing", "wilson", "wing", "wozniak", "yonath",
];

/// Fresh `adjective_surname` name for a derived archive, e.g.
/// `brave_lovelace_4821.zip`. Never derived from the base archive's name.
pub fn random_archive_name() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("eager");
    let surname = SURNAMES.choose(&mut rng).copied().unwrap_or("turing");
    let suffix: u16 = rng.random_range(1000..10000);
    format!("{adjective}_{surname}_{suffix}.zip")
}

/// Reduce an arbitrary name to lower-case `[a-z0-9_-]`, mapping everything
/// else to `_`.
pub fn safe_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() { "package".to_string() } else { stem }
}

/// Stored name of an uploaded archive: the safe stem of the client's file
/// name, ending in `.zip`.
pub fn upload_archive_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = base.strip_suffix(".zip").unwrap_or(base);
    format!("{}.zip", safe_file_stem(stem))
}
