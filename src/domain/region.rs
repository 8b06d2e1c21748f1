// Region resolution - free-text place names to states/union territories
//
// Place names arrive as geocoder output with inconsistent granularity
// (village vs. district vs. city), so exact lookup is layered with
// split-and-scan fallbacks. All scans walk the table in declared order,
// which makes substring tie-breaks deterministic: first declaration wins.
use std::collections::HashMap;

/// Separators seen in geocoder output like "Village, District" or
/// "Tehsil - City". Checked in this order.
const SEPARATORS: &[&str] = &[",", " - ", "|", ";", " in ", " of "];

/// Granularity suffixes stripped before a retry lookup.
const SUFFIXES: &[&str] = &[
    " District",
    " City",
    " Tehsil",
    " Taluka",
    " Block",
    " Village",
    " Town",
];

/// City/district/state declarations. Later duplicates of a name are ignored.
const CITY_STATES: &[(&str, &str)] = &[
    ("Mumbai", "Maharashtra"),
    ("Delhi", "Delhi"),
    ("Bangalore", "Karnataka"),
    ("Hyderabad", "Telangana"),
    ("Chennai", "Tamil Nadu"),
    ("Kolkata", "West Bengal"),
    ("Pune", "Maharashtra"),
    ("Ahmedabad", "Gujarat"),
    ("Jaipur", "Rajasthan"),
    ("Lucknow", "Uttar Pradesh"),
    ("Kanpur", "Uttar Pradesh"),
    ("Nagpur", "Maharashtra"),
    ("Indore", "Madhya Pradesh"),
    ("Thane", "Maharashtra"),
    ("Bhopal", "Madhya Pradesh"),
    ("Visakhapatnam", "Andhra Pradesh"),
    ("Patna", "Bihar"),
    ("Vadodara", "Gujarat"),
    ("Ghaziabad", "Uttar Pradesh"),
    ("Ludhiana", "Punjab"),
    ("Agra", "Uttar Pradesh"),
    ("Nashik", "Maharashtra"),
    ("Faridabad", "Haryana"),
    ("Meerut", "Uttar Pradesh"),
    ("Rajkot", "Gujarat"),
    ("Kalyan", "Maharashtra"),
    ("Vasai", "Maharashtra"),
    ("Varanasi", "Uttar Pradesh"),
    ("Srinagar", "Jammu and Kashmir"),
    ("Aurangabad", "Maharashtra"),
    ("Dhanbad", "Jharkhand"),
    ("Amritsar", "Punjab"),
    ("Allahabad", "Uttar Pradesh"),
    ("Ranchi", "Jharkhand"),
    ("Howrah", "West Bengal"),
    ("Coimbatore", "Tamil Nadu"),
    ("Jabalpur", "Madhya Pradesh"),
    ("Gwalior", "Madhya Pradesh"),
    ("Vijayawada", "Andhra Pradesh"),
    ("Jodhpur", "Rajasthan"),
    ("Madurai", "Tamil Nadu"),
    ("Raipur", "Chhattisgarh"),
    ("Kota", "Rajasthan"),
    ("Guwahati", "Assam"),
    ("Chandigarh", "Chandigarh"),
    ("Solapur", "Maharashtra"),
    ("Hubli", "Karnataka"),
    ("Bareilly", "Uttar Pradesh"),
    ("Moradabad", "Uttar Pradesh"),
    ("Mysore", "Karnataka"),
    ("Gurgaon", "Haryana"),
    ("Aligarh", "Uttar Pradesh"),
    ("Jalandhar", "Punjab"),
    ("Tiruchirappalli", "Tamil Nadu"),
    ("Bhubaneswar", "Odisha"),
    ("Salem", "Tamil Nadu"),
    ("Warangal", "Telangana"),
    ("Mira", "Maharashtra"),
    ("Thiruvananthapuram", "Kerala"),
    ("Bhiwandi", "Maharashtra"),
    ("Saharanpur", "Uttar Pradesh"),
    ("Gorakhpur", "Uttar Pradesh"),
    ("Guntur", "Andhra Pradesh"),
    ("Bikaner", "Rajasthan"),
    ("Amravati", "Maharashtra"),
    ("Noida", "Uttar Pradesh"),
    ("Jamshedpur", "Jharkhand"),
    ("Bhilai", "Chhattisgarh"),
    ("Cuttack", "Odisha"),
    ("Firozabad", "Uttar Pradesh"),
    ("Kochi", "Kerala"),
    ("Nellore", "Andhra Pradesh"),
    ("Bhavnagar", "Gujarat"),
    ("Dehradun", "Uttarakhand"),
    ("Durgapur", "West Bengal"),
    ("Asansol", "West Bengal"),
    ("Rourkela", "Odisha"),
    ("Nanded", "Maharashtra"),
    ("Kolhapur", "Maharashtra"),
    ("Ajmer", "Rajasthan"),
    ("Gulbarga", "Karnataka"),
    ("Jamnagar", "Gujarat"),
    ("Ujjain", "Madhya Pradesh"),
    ("Loni", "Uttar Pradesh"),
    ("Siliguri", "West Bengal"),
    ("Jhansi", "Uttar Pradesh"),
    ("Ulhasnagar", "Maharashtra"),
    ("Jammu", "Jammu and Kashmir"),
    ("Sangli", "Maharashtra"),
    ("Belgaum", "Karnataka"),
    ("Mangalore", "Karnataka"),
    ("Ambattur", "Tamil Nadu"),
    ("Tirunelveli", "Tamil Nadu"),
    ("Malegaon", "Maharashtra"),
    ("Gaya", "Bihar"),
    ("Jalgaon", "Maharashtra"),
    ("Udaipur", "Rajasthan"),
    ("Maheshtala", "West Bengal"),
    ("Tiruppur", "Tamil Nadu"),
    ("Davanagere", "Karnataka"),
    ("Kozhikode", "Kerala"),
    ("Akola", "Maharashtra"),
    ("Kurnool", "Andhra Pradesh"),
    ("Rajpur", "Madhya Pradesh"),
    ("Bokaro", "Jharkhand"),
    ("South Dumdum", "West Bengal"),
    ("Bellary", "Karnataka"),
    ("Patiala", "Punjab"),
    ("Gopalpur", "West Bengal"),
    ("Agartala", "Tripura"),
    ("Bhagalpur", "Bihar"),
    ("Muzaffarnagar", "Uttar Pradesh"),
    ("Bhatpara", "West Bengal"),
    ("Panihati", "West Bengal"),
    ("Latur", "Maharashtra"),
    ("Dhule", "Maharashtra"),
    ("Rohtak", "Haryana"),
    ("Korba", "Chhattisgarh"),
    ("Bhilwara", "Rajasthan"),
    ("Berhampur", "Odisha"),
    ("Muzaffarpur", "Bihar"),
    ("Ahmednagar", "Maharashtra"),
    ("Mathura", "Uttar Pradesh"),
    ("Kollam", "Kerala"),
    ("Avadi", "Tamil Nadu"),
    ("Kadapa", "Andhra Pradesh"),
    ("Kamarhati", "West Bengal"),
    ("Bilaspur", "Chhattisgarh"),
    ("Shahjahanpur", "Uttar Pradesh"),
    ("Satara", "Maharashtra"),
    ("Bijapur", "Karnataka"),
    ("Rampur", "Uttar Pradesh"),
    ("Shivamogga", "Karnataka"),
    ("Chandrapur", "Maharashtra"),
    ("Junagadh", "Gujarat"),
    ("Thrissur", "Kerala"),
    ("Alwar", "Rajasthan"),
    ("Bardhaman", "West Bengal"),
    ("Kulti", "West Bengal"),
    ("Kakinada", "Andhra Pradesh"),
    ("Nizamabad", "Telangana"),
    ("Parbhani", "Maharashtra"),
    ("Tumkur", "Karnataka"),
    ("Hisar", "Haryana"),
    ("Ozhukarai", "Puducherry"),
    ("Bihar Sharif", "Bihar"),
    ("Panipat", "Haryana"),
    ("Darbhanga", "Bihar"),
    ("Bally", "West Bengal"),
    ("Aizawl", "Mizoram"),
    ("Dewas", "Madhya Pradesh"),
    ("Ichalkaranji", "Maharashtra"),
    ("Tirupati", "Andhra Pradesh"),
    ("Karnal", "Haryana"),
    ("Bathinda", "Punjab"),
    ("Jalna", "Maharashtra"),
    ("Barasat", "West Bengal"),
    ("Kirari Suleman Nagar", "Delhi"),
    ("Purnia", "Bihar"),
    ("Satna", "Madhya Pradesh"),
    ("Mau", "Uttar Pradesh"),
    ("Sonipat", "Haryana"),
    ("Farrukhabad", "Uttar Pradesh"),
    ("Sagar", "Madhya Pradesh"),
    ("Durg", "Chhattisgarh"),
    ("Imphal", "Manipur"),
    ("Ratlam", "Madhya Pradesh"),
    ("Hapur", "Uttar Pradesh"),
    ("Arrah", "Bihar"),
    ("Anantapur", "Andhra Pradesh"),
    ("Karimnagar", "Telangana"),
    ("Etawah", "Uttar Pradesh"),
    ("Ambernath", "Maharashtra"),
    ("North Dumdum", "West Bengal"),
    ("Bharatpur", "Rajasthan"),
    ("Begusarai", "Bihar"),
    ("New Delhi", "Delhi"),
    ("Gandhidham", "Gujarat"),
    ("Baranagar", "West Bengal"),
    ("Tiruvottiyur", "Tamil Nadu"),
    ("Puducherry", "Puducherry"),
    ("Sikar", "Rajasthan"),
    ("Thoothukkudi", "Tamil Nadu"),
    ("Rewa", "Madhya Pradesh"),
    ("Mirzapur", "Uttar Pradesh"),
    ("Raichur", "Karnataka"),
    ("Pali", "Rajasthan"),
    ("Ramagundam", "Telangana"),
    ("Haridwar", "Uttarakhand"),
    ("Vijayanagaram", "Andhra Pradesh"),
    ("Katihar", "Bihar"),
    ("Nagercoil", "Tamil Nadu"),
    ("Sri Ganganagar", "Rajasthan"),
    ("Karawal Nagar", "Delhi"),
    ("Mango", "Jharkhand"),
    ("Thanjavur", "Tamil Nadu"),
    ("Bulandshahr", "Uttar Pradesh"),
    ("Uluberia", "West Bengal"),
    ("Murwara", "Madhya Pradesh"),
    ("Sambhal", "Uttar Pradesh"),
    ("Singrauli", "Madhya Pradesh"),
    ("Nadiad", "Gujarat"),
    ("Secunderabad", "Telangana"),
    ("Naihati", "West Bengal"),
    ("Yamunanagar", "Haryana"),
    ("Bidhan Nagar", "West Bengal"),
    ("Pallavaram", "Tamil Nadu"),
    ("Bidar", "Karnataka"),
    ("Munger", "Bihar"),
    ("Panchkula", "Haryana"),
    ("Burhanpur", "Madhya Pradesh"),
    ("Raurkela Industrial Township", "Odisha"),
    ("Kharagpur", "West Bengal"),
    ("Dindigul", "Tamil Nadu"),
    ("Gandhinagar", "Gujarat"),
    ("Hospet", "Karnataka"),
    ("Nangloi Jat", "Delhi"),
    ("Malda", "West Bengal"),
    ("Ongole", "Andhra Pradesh"),
    ("Deoghar", "Jharkhand"),
    ("Chapra", "Bihar"),
    ("Haldia", "West Bengal"),
    ("Khandwa", "Madhya Pradesh"),
    ("Nandyal", "Andhra Pradesh"),
    ("Chittorgarh", "Rajasthan"),
    ("Bhusawal", "Maharashtra"),
    ("Orai", "Uttar Pradesh"),
    ("Bahraich", "Uttar Pradesh"),
    ("Phusro", "Jharkhand"),
    ("Vellore", "Tamil Nadu"),
    ("Mehsana", "Gujarat"),
    ("Raebareli", "Uttar Pradesh"),
    ("Sirsa", "Haryana"),
    ("Danapur", "Bihar"),
    ("Serampore", "West Bengal"),
    ("Sultan Pur Majra", "Delhi"),
    ("Guna", "Madhya Pradesh"),
    ("Jaunpur", "Uttar Pradesh"),
    ("Panvel", "Maharashtra"),
    ("Shivpuri", "Madhya Pradesh"),
    ("Surendranagar Dudhrej", "Gujarat"),
    ("Unnao", "Uttar Pradesh"),
    ("Chinsurah", "West Bengal"),
    ("Alappuzha", "Kerala"),
    ("Kottayam", "Kerala"),
    ("Machilipatnam", "Andhra Pradesh"),
    ("Shimla", "Himachal Pradesh"),
    ("Adoni", "Andhra Pradesh"),
    ("Udupi", "Karnataka"),
    ("Tenali", "Andhra Pradesh"),
    ("Proddatur", "Andhra Pradesh"),
    ("Saharsa", "Bihar"),
    ("Hindupur", "Andhra Pradesh"),
    ("Sasaram", "Bihar"),
    ("Budaun", "Uttar Pradesh"),
    ("Mandsaur", "Madhya Pradesh"),
    ("Chittaranjan", "West Bengal"),
    ("Bilimora", "Gujarat"),
    ("Mokameh", "Bihar"),
    ("Talegaon Dabhade", "Maharashtra"),
    ("Anjangaon", "Maharashtra"),
    ("Tinsukia", "Assam"),
    ("Kanpur Cantonment", "Uttar Pradesh"),
    ("Vrindavan", "Uttar Pradesh"),
    ("Kovvur", "Andhra Pradesh"),
    ("Sahibganj", "Jharkhand"),
    // District names that surface in village searches
    ("Barmer", "Rajasthan"),
    ("Jaisalmer", "Rajasthan"),
    ("Banswara", "Rajasthan"),
    ("Dungarpur", "Rajasthan"),
    ("Jhalawar", "Rajasthan"),
    ("Karauli", "Rajasthan"),
    ("Nagaur", "Rajasthan"),
    ("Pratapgarh", "Rajasthan"),
    ("Rajsamand", "Rajasthan"),
    ("Sawai Madhopur", "Rajasthan"),
    ("Sirohi", "Rajasthan"),
    ("Tonk", "Rajasthan"),
    ("Bundi", "Rajasthan"),
    ("Dausa", "Rajasthan"),
    ("Hanumangarh", "Rajasthan"),
    ("Jhunjhunu", "Rajasthan"),
    ("Dholpur", "Rajasthan"),
    ("Baran", "Rajasthan"),
    ("Churu", "Rajasthan"),
    ("Ganganagar", "Rajasthan"),
    // States and union territories, for direct state searches
    ("Assam", "Assam"),
    ("Bihar", "Bihar"),
    ("Chhattisgarh", "Chhattisgarh"),
    ("Goa", "Goa"),
    ("Gujarat", "Gujarat"),
    ("Haryana", "Haryana"),
    ("Himachal Pradesh", "Himachal Pradesh"),
    ("Jharkhand", "Jharkhand"),
    ("Karnataka", "Karnataka"),
    ("Kerala", "Kerala"),
    ("Madhya Pradesh", "Madhya Pradesh"),
    ("Maharashtra", "Maharashtra"),
    ("Manipur", "Manipur"),
    ("Meghalaya", "Meghalaya"),
    ("Mizoram", "Mizoram"),
    ("Nagaland", "Nagaland"),
    ("Odisha", "Odisha"),
    ("Punjab", "Punjab"),
    ("Rajasthan", "Rajasthan"),
    ("Sikkim", "Sikkim"),
    ("Tamil Nadu", "Tamil Nadu"),
    ("Telangana", "Telangana"),
    ("Tripura", "Tripura"),
    ("Uttar Pradesh", "Uttar Pradesh"),
    ("Uttarakhand", "Uttarakhand"),
    ("West Bengal", "West Bengal"),
    ("Puducherry", "Puducherry"),
    ("Jammu and Kashmir", "Jammu and Kashmir"),
];

/// Representative cities sampled for state-level aggregation. At most the
/// first three are queried per request to stay under provider rate limits.
const STATE_MAJOR_CITIES: &[(&str, &[&str])] = &[
    ("Maharashtra", &["Mumbai", "Pune", "Nagpur"]),
    ("Delhi", &["New Delhi", "Delhi"]),
    ("Karnataka", &["Bangalore", "Mysore"]),
    ("Telangana", &["Hyderabad"]),
    ("Tamil Nadu", &["Chennai", "Madurai"]),
    ("West Bengal", &["Kolkata"]),
    ("Gujarat", &["Ahmedabad", "Surat"]),
    ("Rajasthan", &["Jaipur", "Jodhpur"]),
    ("Uttar Pradesh", &["Lucknow", "Kanpur", "Varanasi"]),
    ("Madhya Pradesh", &["Bhopal", "Indore"]),
    ("Bihar", &["Patna"]),
    ("Punjab", &["Amritsar", "Ludhiana"]),
    ("Haryana", &["Gurgaon", "Faridabad"]),
    ("Kerala", &["Kochi", "Thiruvananthapuram"]),
    ("Odisha", &["Bhubaneswar"]),
    ("Assam", &["Guwahati"]),
    ("Chhattisgarh", &["Raipur"]),
    ("Jharkhand", &["Ranchi", "Jamshedpur"]),
    ("Uttarakhand", &["Dehradun"]),
    ("Himachal Pradesh", &["Shimla"]),
    ("Goa", &["Panaji"]),
    ("Manipur", &["Imphal"]),
    ("Meghalaya", &["Shillong"]),
    ("Mizoram", &["Aizawl"]),
    ("Nagaland", &["Kohima"]),
    ("Tripura", &["Agartala"]),
    ("Arunachal Pradesh", &["Itanagar"]),
    ("Sikkim", &["Gangtok"]),
    ("Andhra Pradesh", &["Visakhapatnam", "Vijayawada"]),
    ("Chandigarh", &["Chandigarh"]),
    ("Puducherry", &["Puducherry"]),
];

/// Immutable lookup table, built once at startup and injected wherever
/// region resolution is needed.
pub struct RegionTable {
    entries: Vec<(&'static str, &'static str)>,
    index: HashMap<&'static str, &'static str>,
}

impl RegionTable {
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(CITY_STATES.len());
        let mut index = HashMap::with_capacity(CITY_STATES.len());
        for &(city, state) in CITY_STATES {
            if !index.contains_key(city) {
                index.insert(city, state);
                entries.push((city, state));
            }
        }
        Self { entries, index }
    }

    /// Resolve a free-text place name to its state, or `None`.
    pub fn resolve(&self, name: &str) -> Option<&'static str> {
        let clean = title_case(name.trim());

        if let Some(state) = self.index.get(clean.as_str()).copied() {
            return Some(state);
        }

        // "Village, District" and similar compound names: test each segment
        // exactly, then by containment against the whole table.
        for sep in SEPARATORS {
            if clean.contains(sep) {
                for part in clean.split(sep).map(str::trim) {
                    if let Some(state) = self.index.get(part).copied() {
                        return Some(state);
                    }
                    for &(city, state) in &self.entries {
                        if part.contains(city) || city.contains(part) {
                            return Some(state);
                        }
                    }
                }
            }
        }

        // "Village, Tehsil, District": the last segment is usually the
        // coarsest and most likely to be in the table.
        if clean.contains(',') {
            let last = clean.rsplit(',').next().map(str::trim).unwrap_or("");
            if let Some(state) = self.index.get(last).copied() {
                return Some(state);
            }
            for &(city, state) in &self.entries {
                if last.contains(city) || city.contains(last) {
                    return Some(state);
                }
            }
        }

        for suffix in SUFFIXES {
            if let Some(stripped) = clean.strip_suffix(suffix) {
                if let Some(state) = self.index.get(stripped).copied() {
                    return Some(state);
                }
            }
        }

        for &(city, state) in &self.entries {
            if clean.contains(city) || city.contains(clean.as_str()) {
                return Some(state);
            }
        }

        None
    }

    /// Representative cities for a state, empty if unknown.
    pub fn major_cities(&self, state: &str) -> &'static [&'static str] {
        STATE_MAJOR_CITIES
            .iter()
            .find(|(name, _)| *name == state)
            .map(|(_, cities)| *cities)
            .unwrap_or(&[])
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Title-case every alphabetic run: first letter upper, rest lower.
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        let table = RegionTable::new();
        assert_eq!(table.resolve("Mumbai"), Some("Maharashtra"));
        assert_eq!(table.resolve("Chennai"), Some("Tamil Nadu"));
    }

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let table = RegionTable::new();
        assert_eq!(table.resolve("  mumbai "), Some("Maharashtra"));
        assert_eq!(table.resolve("NEW DELHI"), Some("Delhi"));
    }

    #[test]
    fn test_village_with_district_segment() {
        let table = RegionTable::new();
        assert_eq!(table.resolve("Some Village, Jodhpur"), Some("Rajasthan"));
    }

    #[test]
    fn test_segment_containment() {
        let table = RegionTable::new();
        assert_eq!(table.resolve("Osiyan Tehsil, Jodhpur District"), Some("Rajasthan"));
    }

    #[test]
    fn test_suffix_stripping() {
        let table = RegionTable::new();
        assert_eq!(table.resolve("Jaipur District"), Some("Rajasthan"));
        assert_eq!(table.resolve("Kochi City"), Some("Kerala"));
    }

    #[test]
    fn test_whole_string_containment() {
        let table = RegionTable::new();
        assert_eq!(table.resolve("Greater Mumbai"), Some("Maharashtra"));
    }

    #[test]
    fn test_direct_state_search() {
        let table = RegionTable::new();
        assert_eq!(table.resolve("Rajasthan"), Some("Rajasthan"));
    }

    #[test]
    fn test_unknown_place() {
        let table = RegionTable::new();
        assert_eq!(table.resolve("Atlantis"), None);
    }

    #[test]
    fn test_duplicate_declarations_collapse() {
        let table = RegionTable::new();
        assert_eq!(table.entries.len(), table.index.len());
    }

    #[test]
    fn test_major_cities() {
        let table = RegionTable::new();
        assert_eq!(table.major_cities("Maharashtra"), &["Mumbai", "Pune", "Nagpur"]);
        assert!(table.major_cities("Atlantis").is_empty());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("some village, jodhpur"), "Some Village, Jodhpur");
        assert_eq!(title_case("vasai-virar"), "Vasai-Virar");
    }
}
