// Built-in country -> airport table for origin/destination fan-out without a network call

/// ISO 3166 alpha-2 country code and the airports served in it, busiest first.
static AIRPORTS_BY_COUNTRY: &[(&str, &[&str])] = &[
    ("AT", &["VIE", "SZG", "LNZ", "GRZ", "KLU", "INN"]),
    ("BE", &["CRL", "BRU"]),
    ("BG", &["SOF", "PDV", "BOJ", "VAR"]),
    ("CY", &["PFO", "LCA"]),
    ("CZ", &["PRG", "BRQ", "OSR", "PED"]),
    ("DE", &["BER", "HHN", "NRN", "CGN", "FMM", "NUE", "HAM", "BRE", "DTM", "SCN", "FKB"]),
    ("DK", &["CPH", "BLL", "AAR"]),
    ("EE", &["TLL"]),
    ("ES", &["MAD", "BCN", "AGP", "ALC", "PMI", "IBZ", "VLC", "SVQ", "TFS", "LPA", "ACE", "FUE", "GRO", "REU", "SDR", "SCQ", "VGO", "ZAZ", "MAH", "XRY", "RMU"]),
    ("FI", &["HEL", "TMP", "LPP", "RVN"]),
    ("FR", &["BVA", "MRS", "NCE", "TLS", "BOD", "NTE", "LIL", "LYS", "CCF", "PIS", "LRH", "TUF", "EGC", "RDZ", "BZR", "PUF", "LIG", "PGF", "FSC", "AJA"]),
    ("GB", &["STN", "LTN", "LGW", "MAN", "BHX", "BRS", "EDI", "GLA", "LPL", "EMA", "LBA", "NCL", "BOH", "EXT", "PIK", "BFS", "ABZ", "CWL", "NQY"]),
    ("GR", &["ATH", "SKG", "CHQ", "HER", "RHO", "CFU", "KGS", "JTR", "JMK", "PVK", "ZTH", "EFL", "KLX"]),
    ("HR", &["ZAG", "SPU", "DBV", "ZAD", "PUY", "OSI", "RJK"]),
    ("HU", &["BUD", "DEB"]),
    ("IE", &["DUB", "SNN", "ORK", "NOC", "KIR"]),
    ("IL", &["TLV", "ETM"]),
    ("IT", &["BGY", "CIA", "FCO", "MXP", "NAP", "CTA", "PMO", "BLQ", "PSA", "TSF", "VCE", "BRI", "BDS", "CAG", "AHO", "OLB", "TRN", "GOA", "VRN", "PSR", "SUF", "PEG", "AOI", "TPS", "CUF", "REG", "CRV", "TRS"]),
    ("JO", &["AMM", "AQJ"]),
    ("LT", &["VNO", "KUN", "PLQ"]),
    ("LU", &["LUX"]),
    ("LV", &["RIX"]),
    ("MA", &["RAK", "FEZ", "AGA", "TNG", "NDR", "RBA", "ESU", "OUD", "TTU"]),
    ("ME", &["TGD", "TIV"]),
    ("MT", &["MLA"]),
    ("NL", &["AMS", "EIN", "MST"]),
    ("NO", &["OSL", "TRF", "HAU"]),
    ("PL", &["WMI", "WAW", "KRK", "KTW", "GDN", "WRO", "POZ", "SZZ", "BZG", "LCJ", "LUZ", "RZE", "IEG", "SZY", "RDO"]),
    ("PT", &["LIS", "OPO", "FAO", "FNC", "PDL", "TER"]),
    ("RO", &["OTP", "CLJ", "TSR", "IAS", "SBZ", "SUJ", "OMR", "CRA", "BCM"]),
    ("RS", &["BEG", "INI"]),
    ("SE", &["ARN", "GOT", "MMX", "NYO", "VST", "SKB"]),
    ("SI", &["LJU"]),
    ("SK", &["BTS", "KSC"]),
    ("TR", &["IST", "SAW", "AYT", "DLM", "BJV"]),
    ("UA", &["KBP", "LWO", "ODS"]),
];

/// Airport codes for `country_code`, minus anything in `exclude`. Both the
/// country and the exclusions are matched case-insensitively; an unknown
/// country yields an empty list.
pub fn airports_by_country<S: AsRef<str>>(country_code: &str, exclude: &[S]) -> Vec<String> {
    let country_code = country_code.trim();

    AIRPORTS_BY_COUNTRY
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(country_code))
        .map(|(_, airports)| {
            airports
                .iter()
                .filter(|airport| {
                    !exclude
                        .iter()
                        .any(|excluded| excluded.as_ref().trim().eq_ignore_ascii_case(airport))
                })
                .map(|airport| airport.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Every country code the built-in table knows.
pub fn known_countries() -> impl Iterator<Item = &'static str> {
    AIRPORTS_BY_COUNTRY.iter().map(|(code, _)| *code)
}
