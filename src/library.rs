use once_cell::sync::Lazy;

use crate::model::{Classification, Instrument, LibraryDefect};

fn entry(
    id: &str,
    category: &str,
    subcategory: &str,
    name: &str,
    description: &str,
    classification: Classification,
    action: &str,
) -> LibraryDefect {
    LibraryDefect {
        id: id.to_string(),
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        classification,
        action: action.to_string(),
    }
}

/// The built-in defect catalogue, active until a custom import replaces it
/// wholesale. Ids are stable so defects derived from an entry keep a valid
/// `library_id` across releases.
static DEFAULT_LIBRARY: Lazy<Vec<LibraryDefect>> = Lazy::new(|| {
    vec![
        entry(
            "lib-001",
            "Verdeelinrichting",
            "Behuizing",
            "Afdekking ontbreekt",
            "De afdekking van de verdeelinrichting ontbreekt, waardoor actieve delen aanraakbaar zijn.",
            Classification::Red,
            "Afdekking aanbrengen en aanraakveiligheid herstellen.",
        ),
        entry(
            "lib-002",
            "Verdeelinrichting",
            "Codering",
            "Groepenverklaring ontbreekt",
            "Er is geen actuele groepenverklaring aanwezig bij de verdeelinrichting.",
            Classification::Yellow,
            "Groepenverklaring opstellen en in de verdeler aanbrengen.",
        ),
        entry(
            "lib-003",
            "Verdeelinrichting",
            "Thermisch",
            "Verhoogde temperatuur",
            "Thermografisch onderzoek toont een verhoogde temperatuur bij een aansluitklem.",
            Classification::Orange,
            "Aansluiting nalopen en klemverbinding opnieuw aandraaien.",
        ),
        entry(
            "lib-004",
            "Bekabeling",
            "Bevestiging",
            "Bekabeling niet deugdelijk bevestigd",
            "Leidingen zijn niet deugdelijk bevestigd en hangen los boven het plafond.",
            Classification::Yellow,
            "Bekabeling deugdelijk bevestigen volgens de installatievoorschriften.",
        ),
        entry(
            "lib-005",
            "Bekabeling",
            "Beschadiging",
            "Beschadigde leiding",
            "De buitenmantel van een leiding is beschadigd; de aderisolatie is zichtbaar.",
            Classification::Orange,
            "Leiding vervangen of de beschadiging duurzaam herstellen.",
        ),
        entry(
            "lib-006",
            "Aarding",
            "Hoofdaarding",
            "Aardingsvoorziening onderbroken",
            "De verbinding met de hoofdaardrail is onderbroken of ontbreekt.",
            Classification::Red,
            "Aardverbinding herstellen en de overgangsweerstand meten.",
        ),
        entry(
            "lib-007",
            "Aarding",
            "Vereffening",
            "Vereffening ontbreekt",
            "Metalen leidingdelen zijn niet opgenomen in de vereffening.",
            Classification::Orange,
            "Vereffeningsverbindingen aanbrengen.",
        ),
        entry(
            "lib-008",
            "Wandcontactdozen",
            "Bevestiging",
            "Wandcontactdoos los",
            "Een wandcontactdoos zit los in de wand.",
            Classification::Yellow,
            "Wandcontactdoos opnieuw bevestigen.",
        ),
        entry(
            "lib-009",
            "Verlichting",
            "Armaturen",
            "Armatuur defect",
            "Een verlichtingsarmatuur is defect of ontbreekt.",
            Classification::Blue,
            "Armatuur vervangen.",
        ),
        entry(
            "lib-010",
            "Documentatie",
            "Tekeningen",
            "Installatietekeningen niet actueel",
            "De aanwezige installatietekeningen komen niet overeen met de situatie.",
            Classification::Blue,
            "Tekeningen actualiseren.",
        ),
    ]
});

/// Known test instruments offered for selection next to user-created ones.
static INSTRUMENT_CATALOG: Lazy<Vec<Instrument>> = Lazy::new(|| {
    vec![
        Instrument {
            id: "inst-fluke-1654b".into(),
            name: "Fluke 1654B".into(),
            serial_number: String::new(),
            calibration_date: None,
        },
        Instrument {
            id: "inst-metrel-mi3152".into(),
            name: "Metrel MI 3152".into(),
            serial_number: String::new(),
            calibration_date: None,
        },
        Instrument {
            id: "inst-flir-e8".into(),
            name: "FLIR E8 warmtebeeldcamera".into(),
            serial_number: String::new(),
            calibration_date: None,
        },
    ]
});

pub fn default_library() -> &'static [LibraryDefect] {
    &DEFAULT_LIBRARY
}

pub fn instrument_catalog() -> &'static [Instrument] {
    &INSTRUMENT_CATALOG
}
