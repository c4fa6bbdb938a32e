//! BACnet Property Value Decoders
//!
//! This module provides utilities for decoding BACnet property values
//! from their encoded representations into typed Rust values.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::object::ObjectType;

/// Decoded BACnet property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Real (float) value
    Real(f32),
    /// Boolean value
    Boolean(bool),
    /// Unsigned integer value
    Unsigned(u32),
    /// Signed integer value
    Signed(i32),
    /// Character string value
    CharacterString(String),
    /// Enumerated value
    Enumerated(u32),
    /// Bit string value
    BitString(Vec<bool>),
    /// Date value (year, month, day, weekday)
    Date(u16, u8, u8, u8),
    /// Time value (hour, minute, second, hundredths)
    Time(u8, u8, u8, u8),
    /// Object identifier value
    ObjectIdentifier(u16, u32), // (object_type, instance)
    /// Null value
    Null,
    /// Unknown/unsupported value type
    Unknown(Vec<u8>),
}

impl PropertyValue {
    /// Get the value as a display string
    pub fn as_display_string(&self) -> String {
        match self {
            PropertyValue::Real(f) => format!("{:.2}", f),
            PropertyValue::Boolean(b) => if *b { "True".to_string() } else { "False".to_string() },
            PropertyValue::Unsigned(u) => u.to_string(),
            PropertyValue::Signed(i) => i.to_string(),
            PropertyValue::CharacterString(s) => s.clone(),
            PropertyValue::Enumerated(e) => format!("Enum({})", e),
            PropertyValue::BitString(bits) => {
                let bit_str: String = bits.iter().map(|b| if *b { '1' } else { '0' }).collect();
                format!("Bits({})", bit_str)
            }
            PropertyValue::Date(y, m, d, w) => format!("{:04}-{:02}-{:02} (DoW:{})", y, m, d, w),
            PropertyValue::Time(h, m, s, hs) => format!("{:02}:{:02}:{:02}.{:02}", h, m, s, hs),
            PropertyValue::ObjectIdentifier(t, i) => format!("Object({}, {})", t, i),
            PropertyValue::Null => "Null".to_string(),
            PropertyValue::Unknown(_) => "Unknown".to_string(),
        }
    }

    /// Check if this is a numeric value
    pub fn is_numeric(&self) -> bool {
        matches!(self, PropertyValue::Real(_) | PropertyValue::Unsigned(_) | PropertyValue::Signed(_))
    }

    /// Get numeric value as f64 if possible
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            PropertyValue::Real(f) => Some(*f as f64),
            PropertyValue::Unsigned(u) => Some(*u as f64),
            PropertyValue::Signed(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// Extract character string from BACnet encoded data
pub fn decode_character_string(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.len() < 2 {
        return None;
    }

    // Check for character string application tag (0x75) or context tag
    let (tag, mut pos) = if data[0] == 0x75 {
        // Application tag with length in next byte
        (0x75, 1)
    } else if (data[0] & 0xF0) == 0x70 {
        // Context tag for character string
        (data[0], 1)
    } else {
        return None;
    };

    if pos >= data.len() {
        return None;
    }

    let length = data[pos] as usize;
    pos += 1;

    if data.len() < pos + length || length == 0 {
        return None;
    }

    // Skip encoding byte (typically 0 for ANSI X3.4)
    if pos >= data.len() {
        return None;
    }
    
    let _encoding = data[pos];
    pos += 1;
    
    if data.len() < pos + length - 1 {
        return None;
    }

    let string_data = &data[pos..pos + length - 1];
    let string = String::from_utf8_lossy(string_data).to_string();

    Some((PropertyValue::CharacterString(string), pos + length - 1))
}

/// Extract real (float) value from BACnet encoded data
pub fn decode_real(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.len() < 5 {
        return None;
    }

    // Check for real application tag (0x44)
    if data[0] != 0x44 {
        return None;
    }

    let bytes = [data[1], data[2], data[3], data[4]];
    let value = f32::from_be_bytes(bytes);
    
    Some((PropertyValue::Real(value), 5))
}

/// Extract boolean value from BACnet encoded data
pub fn decode_boolean(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.len() < 2 {
        return None;
    }

    // Check for boolean application tag (0x11)
    if data[0] != 0x11 {
        return None;
    }

    let value = data[1] != 0;
    Some((PropertyValue::Boolean(value), 2))
}

/// Extract unsigned integer from BACnet encoded data
pub fn decode_unsigned(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.len() < 2 {
        return None;
    }

    // Check for unsigned application tag (0x21, 0x22, 0x23, or 0x24)
    let (tag, length) = match data[0] {
        0x21 => (0x21, 1), // 1 byte
        0x22 => (0x22, 2), // 2 bytes
        0x23 => (0x23, 3), // 3 bytes
        0x24 => (0x24, 4), // 4 bytes
        _ => return None,
    };

    if data.len() < 1 + length {
        return None;
    }

    let mut value = 0u32;
    for i in 0..length {
        value = (value << 8) | (data[1 + i] as u32);
    }

    Some((PropertyValue::Unsigned(value), 1 + length))
}

/// Extract signed integer from BACnet encoded data  
pub fn decode_signed(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.len() < 2 {
        return None;
    }

    // Check for signed application tag (0x31, 0x32, 0x33, or 0x34)
    let (tag, length) = match data[0] {
        0x31 => (0x31, 1), // 1 byte
        0x32 => (0x32, 2), // 2 bytes
        0x33 => (0x33, 3), // 3 bytes
        0x34 => (0x34, 4), // 4 bytes
        _ => return None,
    };

    if data.len() < 1 + length {
        return None;
    }

    let mut value = if (data[1] & 0x80) != 0 { 0xFFFFFFFFu32 } else { 0 }; // Sign extend
    for i in 0..length {
        value = (value << 8) | (data[1 + i] as u32);
    }

    Some((PropertyValue::Signed(value as i32), 1 + length))
}

/// Extract enumerated value from BACnet encoded data
pub fn decode_enumerated(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.len() < 2 {
        return None;
    }

    // Check for enumerated application tag (0x91, 0x92, 0x93, or 0x94)
    let (tag, length) = match data[0] {
        0x91 => (0x91, 1), // 1 byte
        0x92 => (0x92, 2), // 2 bytes
        0x93 => (0x93, 3), // 3 bytes
        0x94 => (0x94, 4), // 4 bytes
        _ => return None,
    };

    if data.len() < 1 + length {
        return None;
    }

    let mut value = 0u32;
    for i in 0..length {
        value = (value << 8) | (data[1 + i] as u32);
    }

    Some((PropertyValue::Enumerated(value), 1 + length))
}

/// Extract object identifier from BACnet encoded data
pub fn decode_object_identifier(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.len() < 5 {
        return None;
    }

    // Check for object identifier application tag (0xC4)
    if data[0] != 0xC4 {
        return None;
    }

    let obj_id_bytes = [data[1], data[2], data[3], data[4]];
    let obj_id = u32::from_be_bytes(obj_id_bytes);
    let object_type = ((obj_id >> 22) & 0x3FF) as u16;
    let instance = obj_id & 0x3FFFFF;

    Some((PropertyValue::ObjectIdentifier(object_type, instance), 5))
}

/// Extract present value based on object type
pub fn decode_present_value(data: &[u8], object_type: ObjectType) -> Option<(PropertyValue, usize)> {
    if data.is_empty() {
        return None;
    }

    match object_type {
        ObjectType::AnalogInput | ObjectType::AnalogOutput | ObjectType::AnalogValue => {
            decode_real(data)
        }
        ObjectType::BinaryInput | ObjectType::BinaryOutput | ObjectType::BinaryValue => {
            decode_boolean(data)
        }
        ObjectType::MultiStateInput | ObjectType::MultiStateOutput | ObjectType::MultiStateValue => {
            decode_unsigned(data)
        }
        _ => None,
    }
}

/// Decode engineering units enumeration
pub fn decode_units(data: &[u8]) -> Option<(String, usize)> {
    if let Some((PropertyValue::Enumerated(units_id), consumed)) = decode_enumerated(data) {
        let units_name = match units_id {
            // Basic units
            0 => "no-units",
            1 => "percent",
            2 => "parts-per-million",
            3 => "parts-per-billion",
            4 => "microsiemens",
            5 => "millisiemens",
            6 => "siemens",
            7 => "mole-percent",
            
            // Area units
            8 => "square-meters",
            9 => "square-centimeters",
            10 => "square-feet",
            11 => "square-inches",
            
            // Currency units
            12 => "currency1",
            13 => "currency2",
            14 => "currency3",
            15 => "currency4",
            16 => "currency5",
            17 => "currency6",
            18 => "currency7",
            19 => "currency8",
            20 => "currency9",
            21 => "currency10",
            
            // Electrical units
            22 => "milliamperes",
            23 => "amperes",
            24 => "ampere-seconds",
            25 => "ampere-square-meters",
            26 => "amperes-per-meter",
            27 => "amperes-per-square-meter",
            28 => "ampere-square-meters-per-joule-second",
            29 => "farads",
            30 => "henrys",
            31 => "ohms",
            32 => "ohm-meters",
            33 => "milliohms",
            34 => "kilohms",
            35 => "megohms",
            36 => "siemens-per-meter",
            37 => "teslas",
            38 => "volts",
            39 => "millivolts",
            40 => "kilovolts",
            41 => "megavolts",
            42 => "volt-amperes",
            43 => "kilovolt-amperes",
            44 => "megavolt-amperes",
            45 => "volt-amperes-reactive",
            46 => "kilovolt-amperes-reactive",
            47 => "megavolt-amperes-reactive",
            48 => "volts-per-degree-kelvin",
            49 => "volts-per-meter",
            50 => "webers",
            
            // Energy units
            51 => "btus",
            52 => "kilo-btus",
            53 => "mega-btus",
            54 => "kilojoules",
            55 => "megajoules",
            56 => "gigajoules",
            57 => "calories",
            58 => "kilocalories",
            59 => "megacalories",
            60 => "gigacalories",
            61 => "joules",
            
            // Temperature units
            62 => "degrees-celsius",
            63 => "degrees-fahrenheit",
            64 => "degrees-kelvin",
            65 => "degrees-rankine",
            66 => "delta-degrees-fahrenheit",
            
            // Pressure units
            67 => "pascals",
            68 => "kilopascals",
            69 => "megapascals",
            70 => "millibars",
            71 => "bars",
            72 => "pounds-per-square-inch",
            73 => "centimeters-of-water",
            74 => "inches-of-water",
            75 => "millimeters-of-mercury",
            76 => "centimeters-of-mercury",
            77 => "inches-of-mercury",
            
            // Time units
            78 => "years",
            79 => "months",
            80 => "weeks",
            81 => "days",
            82 => "hours",
            83 => "minutes",
            84 => "seconds",
            85 => "hundredths-seconds",
            86 => "milliseconds",
            
            // Volume units
            87 => "cubic-feet",
            88 => "cubic-meters",
            89 => "imperial-gallons",
            90 => "milliliters",
            91 => "liters",
            92 => "us-gallons",
            
            // Volumetric Flow units
            93 => "cubic-feet-per-second",
            94 => "cubic-feet-per-minute",
            95 => "million-standard-cubic-feet-per-minute",
            96 => "cubic-feet-per-hour",
            97 => "cubic-feet-per-day",
            98 => "standard-cubic-feet-per-day",
            99 => "million-standard-cubic-feet-per-day",
            100 => "thousand-cubic-feet-per-day",
            101 => "thousand-standard-cubic-feet-per-day",
            102 => "pounds-mass-per-day",
            103 => "cubic-meters-per-second",
            104 => "cubic-meters-per-minute",
            105 => "cubic-meters-per-hour",
            106 => "cubic-meters-per-day",
            107 => "imperial-gallons-per-minute",
            108 => "milliliters-per-second",
            109 => "liters-per-second",
            110 => "liters-per-minute",
            111 => "liters-per-hour",
            112 => "us-gallons-per-minute",
            113 => "us-gallons-per-hour",
            
            // Power units
            114 => "watts",
            115 => "kilowatts",
            116 => "megawatts",
            117 => "btus-per-hour",
            118 => "kilo-btus-per-hour",
            119 => "horsepower",
            120 => "tons-refrigeration",
            
            // Mass units
            121 => "grams",
            122 => "kilograms",
            123 => "pounds-mass",
            124 => "tons",
            
            // Mass Flow units
            125 => "grams-per-second",
            126 => "grams-per-minute",
            127 => "kilograms-per-second",
            128 => "kilograms-per-minute",
            129 => "kilograms-per-hour",
            130 => "pounds-mass-per-minute",
            131 => "pounds-mass-per-hour",
            132 => "pounds-mass-per-second",
            133 => "tons-per-hour",
            
            // Length units
            134 => "millimeters",
            135 => "centimeters",
            136 => "meters",
            137 => "inches",
            138 => "feet",
            
            // Light units
            139 => "candelas",
            140 => "candelas-per-square-meter",
            141 => "watts-per-square-foot",
            142 => "watts-per-square-meter",
            143 => "lumens",
            144 => "luxes",
            145 => "foot-candles",
            
            // Velocity units
            146 => "meters-per-second",
            147 => "kilometers-per-hour",
            148 => "feet-per-second",
            149 => "feet-per-minute",
            150 => "miles-per-hour",
            
            // Acceleration units
            151 => "meters-per-second-per-second",
            
            // Force units
            152 => "newtons",
            
            // Frequency units
            153 => "cycles-per-hour",
            154 => "cycles-per-minute",
            155 => "hertz",
            156 => "kilohertz",
            157 => "megahertz",
            158 => "per-hour",
            
            // Humidity units
            159 => "grams-of-water-per-kilogram-dry-air",
            160 => "percent-relative-humidity",
            
            // Enthalpy units
            161 => "btus-per-pound",
            162 => "btus-per-pound-dry-air",
            163 => "joules-per-kilogram",
            164 => "joules-per-kilogram-dry-air",
            165 => "kilojoules-per-kilogram",
            166 => "kilojoules-per-kilogram-dry-air",
            167 => "megajoules-per-kilogram-dry-air",
            
            // Entropy units
            168 => "joules-per-degree-kelvin",
            169 => "joules-per-kilogram-degree-kelvin",
            170 => "kilojoules-per-degree-kelvin",
            171 => "megajoules-per-degree-kelvin",
            
            // Specific Heat units
            172 => "joules-per-kilogram-degree-kelvin",
            
            // Specific Volume units
            173 => "cubic-meters-per-kilogram",
            174 => "cubic-feet-per-pound",
            
            // Thermal Conductivity units
            175 => "watts-per-meter-degree-kelvin",
            
            // Thermal Resistance units  
            176 => "square-meter-degree-kelvin-per-watt",
            
            // Thermal Capacity units
            177 => "joules-per-degree-kelvin",
            
            // Energy Density units
            178 => "joules-per-cubic-meter",
            179 => "watt-hours-per-cubic-meter",
            180 => "btus-per-cubic-foot",
            
            // Power Density units
            181 => "watts-per-cubic-meter",
            
            // Additional common HVAC units
            182 => "cfm-per-square-foot",
            183 => "liters-per-second-per-square-meter",
            184 => "cubic-feet-per-minute-per-square-foot",
            185 => "watts-per-square-meter-degree-kelvin",
            186 => "square-feet",
            187 => "square-meters",
            188 => "btus-per-hour-square-foot",
            189 => "btus-per-hour-square-foot-degree-fahrenheit",
            190 => "degrees-fahrenheit-hour-square-feet-per-btu",
            
            _ => "unknown-units",
        };
        Some((units_name.to_string(), consumed))
    } else {
        None
    }
}

/// Get the numeric unit ID from a unit name string
pub fn get_unit_id(unit_name: &str) -> Option<u32> {
    match unit_name {
        "no-units" => Some(0),
        "percent" => Some(1),
        "parts-per-million" => Some(2),
        "parts-per-billion" => Some(3),
        "microsiemens" => Some(4),
        "millisiemens" => Some(5),
        "siemens" => Some(6),
        "mole-percent" => Some(7),
        "square-meters" => Some(8),
        "square-centimeters" => Some(9),
        "square-feet" => Some(10),
        "square-inches" => Some(11),
        "currency1" => Some(12),
        "currency2" => Some(13),
        "currency3" => Some(14),
        "currency4" => Some(15),
        "currency5" => Some(16),
        "currency6" => Some(17),
        "currency7" => Some(18),
        "currency8" => Some(19),
        "currency9" => Some(20),
        "currency10" => Some(21),
        "milliamperes" => Some(22),
        "amperes" => Some(23),
        "ampere-seconds" => Some(24),
        "ampere-square-meters" => Some(25),
        "amperes-per-meter" => Some(26),
        "amperes-per-square-meter" => Some(27),
        "ampere-square-meters-per-joule-second" => Some(28),
        "farads" => Some(29),
        "henrys" => Some(30),
        "ohms" => Some(31),
        "ohm-meters" => Some(32),
        "milliohms" => Some(33),
        "kilohms" => Some(34),
        "megohms" => Some(35),
        "siemens-per-meter" => Some(36),
        "teslas" => Some(37),
        "volts" => Some(38),
        "millivolts" => Some(39),
        "kilovolts" => Some(40),
        "megavolts" => Some(41),
        "volt-amperes" => Some(42),
        "kilovolt-amperes" => Some(43),
        "megavolt-amperes" => Some(44),
        "volt-amperes-reactive" => Some(45),
        "kilovolt-amperes-reactive" => Some(46),
        "megavolt-amperes-reactive" => Some(47),
        "volts-per-degree-kelvin" => Some(48),
        "volts-per-meter" => Some(49),
        "webers" => Some(50),
        "btus" => Some(51),
        "kilo-btus" => Some(52),
        "mega-btus" => Some(53),
        "kilojoules" => Some(54),
        "megajoules" => Some(55),
        "gigajoules" => Some(56),
        "calories" => Some(57),
        "kilocalories" => Some(58),
        "megacalories" => Some(59),
        "gigacalories" => Some(60),
        "joules" => Some(61),
        "degrees-celsius" => Some(62),
        "degrees-fahrenheit" => Some(63),
        "degrees-kelvin" => Some(64),
        "degrees-rankine" => Some(65),
        "delta-degrees-fahrenheit" => Some(66),
        "pascals" => Some(67),
        "kilopascals" => Some(68),
        "megapascals" => Some(69),
        "millibars" => Some(70),
        "bars" => Some(71),
        "pounds-per-square-inch" => Some(72),
        "centimeters-of-water" => Some(73),
        "inches-of-water" => Some(74),
        "millimeters-of-mercury" => Some(75),
        "centimeters-of-mercury" => Some(76),
        "inches-of-mercury" => Some(77),
        "years" => Some(78),
        "months" => Some(79),
        "weeks" => Some(80),
        "days" => Some(81),
        "hours" => Some(82),
        "minutes" => Some(83),
        "seconds" => Some(84),
        "hundredths-seconds" => Some(85),
        "milliseconds" => Some(86),
        "cubic-feet" => Some(87),
        "cubic-meters" => Some(88),
        "imperial-gallons" => Some(89),
        "milliliters" => Some(90),
        "liters" => Some(91),
        "us-gallons" => Some(92),
        "cubic-feet-per-second" => Some(93),
        "cubic-feet-per-minute" => Some(94),
        "million-standard-cubic-feet-per-minute" => Some(95),
        "cubic-feet-per-hour" => Some(96),
        "cubic-feet-per-day" => Some(97),
        "standard-cubic-feet-per-day" => Some(98),
        "million-standard-cubic-feet-per-day" => Some(99),
        "thousand-cubic-feet-per-day" => Some(100),
        "thousand-standard-cubic-feet-per-day" => Some(101),
        "pounds-mass-per-day" => Some(102),
        "cubic-meters-per-second" => Some(103),
        "cubic-meters-per-minute" => Some(104),
        "cubic-meters-per-hour" => Some(105),
        "cubic-meters-per-day" => Some(106),
        "imperial-gallons-per-minute" => Some(107),
        "milliliters-per-second" => Some(108),
        "liters-per-second" => Some(109),
        "liters-per-minute" => Some(110),
        "liters-per-hour" => Some(111),
        "us-gallons-per-minute" => Some(112),
        "us-gallons-per-hour" => Some(113),
        "watts" => Some(114),
        "kilowatts" => Some(115),
        "megawatts" => Some(116),
        "btus-per-hour" => Some(117),
        "kilo-btus-per-hour" => Some(118),
        "horsepower" => Some(119),
        "tons-refrigeration" => Some(120),
        "grams" => Some(121),
        "kilograms" => Some(122),
        "pounds-mass" => Some(123),
        "tons" => Some(124),
        "grams-per-second" => Some(125),
        "grams-per-minute" => Some(126),
        "kilograms-per-second" => Some(127),
        "kilograms-per-minute" => Some(128),
        "kilograms-per-hour" => Some(129),
        "pounds-mass-per-minute" => Some(130),
        "pounds-mass-per-hour" => Some(131),
        "pounds-mass-per-second" => Some(132),
        "tons-per-hour" => Some(133),
        "millimeters" => Some(134),
        "centimeters" => Some(135),
        "meters" => Some(136),
        "inches" => Some(137),
        "feet" => Some(138),
        "candelas" => Some(139),
        "candelas-per-square-meter" => Some(140),
        "watts-per-square-foot" => Some(141),
        "watts-per-square-meter" => Some(142),
        "lumens" => Some(143),
        "luxes" => Some(144),
        "foot-candles" => Some(145),
        "meters-per-second" => Some(146),
        "kilometers-per-hour" => Some(147),
        "feet-per-second" => Some(148),
        "feet-per-minute" => Some(149),
        "miles-per-hour" => Some(150),
        "meters-per-second-per-second" => Some(151),
        "newtons" => Some(152),
        "cycles-per-hour" => Some(153),
        "cycles-per-minute" => Some(154),
        "hertz" => Some(155),
        "kilohertz" => Some(156),
        "megahertz" => Some(157),
        "per-hour" => Some(158),
        "grams-of-water-per-kilogram-dry-air" => Some(159),
        "percent-relative-humidity" => Some(160),
        "btus-per-pound" => Some(161),
        "btus-per-pound-dry-air" => Some(162),
        "joules-per-kilogram" => Some(163),
        "joules-per-kilogram-dry-air" => Some(164),
        "kilojoules-per-kilogram" => Some(165),
        "kilojoules-per-kilogram-dry-air" => Some(166),
        "megajoules-per-kilogram-dry-air" => Some(167),
        "joules-per-degree-kelvin" => Some(168),
        "joules-per-kilogram-degree-kelvin" => Some(169),
        "kilojoules-per-degree-kelvin" => Some(170),
        "megajoules-per-degree-kelvin" => Some(171),
        "cubic-meters-per-kilogram" => Some(173),
        "cubic-feet-per-pound" => Some(174),
        "watts-per-meter-degree-kelvin" => Some(175),
        "square-meter-degree-kelvin-per-watt" => Some(176),
        "joules-per-cubic-meter" => Some(178),
        "watt-hours-per-cubic-meter" => Some(179),
        "btus-per-cubic-foot" => Some(180),
        "watts-per-cubic-meter" => Some(181),
        "cfm-per-square-foot" => Some(182),
        "liters-per-second-per-square-meter" => Some(183),
        "cubic-feet-per-minute-per-square-foot" => Some(184),
        "watts-per-square-meter-degree-kelvin" => Some(185),
        "btus-per-hour-square-foot" => Some(188),
        "btus-per-hour-square-foot-degree-fahrenheit" => Some(189),
        "degrees-fahrenheit-hour-square-feet-per-btu" => Some(190),
        _ => None,
    }
}

/// Extract bit string (status flags) from BACnet encoded data
pub fn decode_bit_string(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.len() < 3 {
        return None;
    }

    // Check for bit string application tag (0x82)
    if data[0] != 0x82 {
        return None;
    }

    let length = data[1] as usize;
    if data.len() < 2 + length {
        return None;
    }

    let unused_bits = data[2];
    let mut bits = Vec::new();

    for i in 3..2 + length {
        let byte = data[i];
        for bit_pos in (0..8).rev() {
            bits.push((byte & (1 << bit_pos)) != 0);
        }
    }

    // Remove unused bits from the end
    if unused_bits > 0 && unused_bits < 8 {
        let total_bits = bits.len();
        bits.truncate(total_bits - unused_bits as usize);
    }

    Some((PropertyValue::BitString(bits), 2 + length))
}

/// Decode status flags specifically
pub fn decode_status_flags(data: &[u8]) -> Option<(Vec<bool>, usize)> {
    if let Some((PropertyValue::BitString(bits), consumed)) = decode_bit_string(data) {
        // Status flags are typically 4 bits: in-alarm, fault, overridden, out-of-service
        Some((bits, consumed))
    } else {
        None
    }
}

/// Generic property value decoder - tries multiple decoders
pub fn decode_property_value(data: &[u8]) -> Option<(PropertyValue, usize)> {
    if data.is_empty() {
        return None;
    }

    // Try different decoders based on the tag
    match data[0] {
        0x00 => Some((PropertyValue::Null, 1)),
        0x11 => decode_boolean(data),
        0x21..=0x24 => decode_unsigned(data),
        0x31..=0x34 => decode_signed(data),
        0x44 => decode_real(data),
        0x75 => decode_character_string(data),
        0x82 => decode_bit_string(data),
        0x91..=0x94 => decode_enumerated(data),
        0xC4 => decode_object_identifier(data),
        _ => {
            // Unknown tag - return raw data
            Some((PropertyValue::Unknown(data.to_vec()), data.len()))
        }
    }
}

// ---- Composite property value types (ASHRAE 135 clause 21 constructed values) ----
//
// These generalize the primitive decoders above into full constructed types:
// every SEQUENCE field carries its own context tag (clause 20.2.1.1) so optional
// fields can be detected by tag mismatch rather than position, and every type
// gets `encode`/`decode` (the bare field sequence) plus `encode_context`/
// `decode_context` (the same sequence wrapped in an opening/closing tag pair,
// for when the whole composite is itself one field of a larger message).

use crate::encoding::{
    self,
    advanced::context::{decode_context_tag, encode_closing_tag, encode_context_tag, encode_opening_tag},
    EncodingError,
};

type CodecResult<T> = encoding::Result<T>;

/// Strip an application tag header off `temp` and rewrap the same value bytes
/// under a context-specific tag. Generalizes the idiom used by
/// `encoding::encode_context_unsigned` to value kinds whose header isn't
/// always one byte (octet/character strings can exceed 4 bytes).
fn rewrap_as_context(temp: Vec<u8>, tag_number: u8) -> CodecResult<Vec<u8>> {
    let (_, length, header_len) = encoding::decode_application_tag(&temp)?;
    let mut buffer = Vec::new();
    encode_context_tag(&mut buffer, tag_number, length)?;
    buffer.extend_from_slice(&temp[header_len..]);
    Ok(buffer)
}

fn encode_context_boolean(value: bool, tag_number: u8) -> CodecResult<Vec<u8>> {
    let mut temp = Vec::new();
    encoding::encode_boolean(&mut temp, value)?;
    rewrap_as_context(temp, tag_number)
}

fn decode_context_boolean(data: &[u8], tag_number: u8) -> CodecResult<(bool, usize)> {
    let (actual_tag, length, mut consumed) = decode_context_tag(data)?;
    if actual_tag != tag_number || length != 1 {
        return Err(EncodingError::InvalidTag);
    }
    if data.len() < consumed + 1 {
        return Err(EncodingError::BufferUnderflow);
    }
    let value = data[consumed] != 0;
    consumed += 1;
    Ok((value, consumed))
}

fn encode_context_signed(value: i32, tag_number: u8) -> CodecResult<Vec<u8>> {
    let mut temp = Vec::new();
    encoding::encode_signed(&mut temp, value)?;
    rewrap_as_context(temp, tag_number)
}

fn decode_context_signed(data: &[u8], tag_number: u8) -> CodecResult<(i32, usize)> {
    let (actual_tag, length, consumed) = decode_context_tag(data)?;
    if actual_tag != tag_number {
        return Err(EncodingError::InvalidTag);
    }
    if data.len() < consumed + length {
        return Err(EncodingError::BufferUnderflow);
    }
    let mut value = if length > 0 && (data[consumed] & 0x80) != 0 {
        -1i32
    } else {
        0
    };
    for i in 0..length {
        value = (value << 8) | (data[consumed + i] as i32);
    }
    Ok((value, consumed + length))
}

fn encode_context_real(value: f32, tag_number: u8) -> CodecResult<Vec<u8>> {
    let mut temp = Vec::new();
    encoding::encode_real(&mut temp, value)?;
    rewrap_as_context(temp, tag_number)
}

fn decode_context_real(data: &[u8], tag_number: u8) -> CodecResult<(f32, usize)> {
    let (actual_tag, length, consumed) = decode_context_tag(data)?;
    if actual_tag != tag_number || length != 4 {
        return Err(EncodingError::InvalidLength);
    }
    if data.len() < consumed + 4 {
        return Err(EncodingError::BufferUnderflow);
    }
    let bytes = [
        data[consumed],
        data[consumed + 1],
        data[consumed + 2],
        data[consumed + 3],
    ];
    Ok((f32::from_be_bytes(bytes), consumed + 4))
}

fn encode_context_time(value: (u8, u8, u8, u8), tag_number: u8) -> CodecResult<Vec<u8>> {
    let mut temp = Vec::new();
    encoding::encode_time(&mut temp, value.0, value.1, value.2, value.3)?;
    rewrap_as_context(temp, tag_number)
}

fn decode_context_time(data: &[u8], tag_number: u8) -> CodecResult<((u8, u8, u8, u8), usize)> {
    let (actual_tag, length, consumed) = decode_context_tag(data)?;
    if actual_tag != tag_number || length != 4 {
        return Err(EncodingError::InvalidLength);
    }
    if data.len() < consumed + 4 {
        return Err(EncodingError::BufferUnderflow);
    }
    let value = (
        data[consumed],
        data[consumed + 1],
        data[consumed + 2],
        data[consumed + 3],
    );
    Ok((value, consumed + 4))
}

fn encode_context_octet_string(value: &[u8], tag_number: u8) -> CodecResult<Vec<u8>> {
    let mut temp = Vec::new();
    encoding::encode_octet_string(&mut temp, value)?;
    rewrap_as_context(temp, tag_number)
}

fn decode_context_octet_string(data: &[u8], tag_number: u8) -> CodecResult<(Vec<u8>, usize)> {
    let (actual_tag, length, mut consumed) = decode_context_tag(data)?;
    if actual_tag != tag_number {
        return Err(EncodingError::InvalidTag);
    }
    if data.len() < consumed + length {
        return Err(EncodingError::BufferUnderflow);
    }
    let value = data[consumed..consumed + length].to_vec();
    consumed += length;
    Ok((value, consumed))
}

fn encode_context_character_string(value: &str, tag_number: u8) -> CodecResult<Vec<u8>> {
    let mut temp = Vec::new();
    encoding::encode_character_string(&mut temp, value)?;
    rewrap_as_context(temp, tag_number)
}

fn decode_context_character_string(data: &[u8], tag_number: u8) -> CodecResult<(String, usize)> {
    let (actual_tag, length, consumed) = decode_context_tag(data)?;
    if actual_tag != tag_number || length == 0 {
        return Err(EncodingError::InvalidLength);
    }
    if data.len() < consumed + length {
        return Err(EncodingError::BufferUnderflow);
    }
    // First byte of the value is the same character-set discriminator
    // `encoding::decode_character_string` understands; ANSI X3.4 only here,
    // since that is all this module's byte-oriented helpers need.
    let bytes = &data[consumed + 1..consumed + length];
    let value = String::from_utf8_lossy(bytes).to_string();
    Ok((value, consumed + length))
}

/// BACnetWeekNDay: a (month, week-of-month, day-of-week) pattern used by
/// calendar/schedule objects, encoded as a 3-byte octet string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekNDay {
    pub month: u8,
    pub week_of_month: u8,
    pub day_of_week: u8,
}

impl WeekNDay {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        encoding::encode_octet_string(buffer, &[self.month, self.week_of_month, self.day_of_week])
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let (bytes, consumed) = encoding::decode_octet_string(data)?;
        if bytes.len() != 3 {
            return Err(EncodingError::InvalidLength);
        }
        Ok((
            Self {
                month: bytes[0],
                week_of_month: bytes[1],
                day_of_week: bytes[2],
            },
            consumed,
        ))
    }

    pub fn encode_context(&self, tag_number: u8) -> CodecResult<Vec<u8>> {
        encode_context_octet_string(&[self.month, self.week_of_month, self.day_of_week], tag_number)
    }

    pub fn decode_context(data: &[u8], tag_number: u8) -> CodecResult<(Self, usize)> {
        let (bytes, consumed) = decode_context_octet_string(data, tag_number)?;
        if bytes.len() != 3 {
            return Err(EncodingError::InvalidLength);
        }
        Ok((
            Self {
                month: bytes[0],
                week_of_month: bytes[1],
                day_of_week: bytes[2],
            },
            consumed,
        ))
    }
}

/// BACnetTimeStamp ::= CHOICE { time [0], sequence-number [1], date-time [2] }
#[derive(Debug, Clone, PartialEq)]
pub enum TimeStamp {
    Time((u8, u8, u8, u8)),
    SequenceNumber(u16),
    DateTime {
        date: (u16, u8, u8, u8),
        time: (u8, u8, u8, u8),
    },
}

impl TimeStamp {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        match self {
            TimeStamp::Time(t) => buffer.extend_from_slice(&encode_context_time(*t, 0)?),
            TimeStamp::SequenceNumber(n) => {
                buffer.extend_from_slice(&encoding::encode_context_unsigned(*n as u32, 1)?)
            }
            TimeStamp::DateTime { date, time } => {
                encode_opening_tag(buffer, 2)?;
                encoding::encode_date(buffer, date.0, date.1, date.2, date.3)?;
                encoding::encode_time(buffer, time.0, time.1, time.2, time.3)?;
                encode_closing_tag(buffer, 2)?;
            }
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        if let Ok((t, consumed)) = decode_context_time(data, 0) {
            return Ok((TimeStamp::Time(t), consumed));
        }
        if let Ok((n, consumed)) = encoding::decode_context_unsigned(data, 1) {
            return Ok((TimeStamp::SequenceNumber(n as u16), consumed));
        }
        if !data.is_empty() && data[0] == 0x2E {
            let mut pos = 1;
            let (date, consumed) = encoding::decode_date(&data[pos..])?;
            pos += consumed;
            let (time, consumed) = encoding::decode_time(&data[pos..])?;
            pos += consumed;
            if pos >= data.len() || data[pos] != 0x2F {
                return Err(EncodingError::InvalidTag);
            }
            pos += 1;
            return Ok((TimeStamp::DateTime { date, time }, pos));
        }
        Err(EncodingError::InvalidTag)
    }

    pub fn encode_context(&self, tag_number: u8) -> CodecResult<Vec<u8>> {
        let mut buffer = Vec::new();
        encode_opening_tag(&mut buffer, tag_number)?;
        self.encode(&mut buffer)?;
        encode_closing_tag(&mut buffer, tag_number)?;
        Ok(buffer)
    }

    pub fn decode_context(data: &[u8], tag_number: u8) -> CodecResult<(Self, usize)> {
        if data.is_empty() || data[0] != (0x0E | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        let (value, inner_consumed) = Self::decode(&data[1..])?;
        let mut pos = 1 + inner_consumed;
        if pos >= data.len() || data[pos] != (0x0F | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;
        Ok((value, pos))
    }
}

/// BACnetPropertyReference ::= SEQUENCE { property-identifier [0], property-array-index [1] OPTIONAL }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyReference {
    pub property_identifier: u32,
    pub property_array_index: Option<u32>,
}

impl PropertyReference {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        buffer.extend_from_slice(&encoding::encode_context_enumerated(self.property_identifier, 0)?);
        if let Some(index) = self.property_array_index {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(index, 1)?);
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let mut pos = 0;
        let (property_identifier, consumed) = encoding::decode_context_enumerated(&data[pos..], 0)?;
        pos += consumed;
        let property_array_index = match encoding::decode_context_unsigned(&data[pos..], 1) {
            Ok((index, consumed)) => {
                pos += consumed;
                Some(index)
            }
            Err(_) => None,
        };
        Ok((
            Self {
                property_identifier,
                property_array_index,
            },
            pos,
        ))
    }

    pub fn encode_context(&self, tag_number: u8) -> CodecResult<Vec<u8>> {
        let mut buffer = Vec::new();
        encode_opening_tag(&mut buffer, tag_number)?;
        self.encode(&mut buffer)?;
        encode_closing_tag(&mut buffer, tag_number)?;
        Ok(buffer)
    }

    pub fn decode_context(data: &[u8], tag_number: u8) -> CodecResult<(Self, usize)> {
        if data.is_empty() || data[0] != (0x0E | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        let (value, inner_consumed) = Self::decode(&data[1..])?;
        let mut pos = 1 + inner_consumed;
        if pos >= data.len() || data[pos] != (0x0F | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;
        Ok((value, pos))
    }
}

/// BACnetDeviceObjectPropertyReference ::= SEQUENCE { object-identifier [0],
/// property-identifier [1], property-array-index [2] OPTIONAL, device-identifier [3] OPTIONAL }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceObjectPropertyReference {
    pub object_identifier: (u16, u32),
    pub property_identifier: u32,
    pub property_array_index: Option<u32>,
    pub device_identifier: Option<(u16, u32)>,
}

impl DeviceObjectPropertyReference {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        buffer.extend_from_slice(&encoding::encode_context_object_id(
            self.object_identifier.0,
            self.object_identifier.1,
            0,
        )?);
        buffer.extend_from_slice(&encoding::encode_context_enumerated(self.property_identifier, 1)?);
        if let Some(index) = self.property_array_index {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(index, 2)?);
        }
        if let Some((object_type, instance)) = self.device_identifier {
            buffer.extend_from_slice(&encoding::encode_context_object_id(object_type, instance, 3)?);
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let mut pos = 0;
        let (object_identifier, consumed) = encoding::decode_context_object_id(&data[pos..], 0)?;
        pos += consumed;
        let (property_identifier, consumed) = encoding::decode_context_enumerated(&data[pos..], 1)?;
        pos += consumed;
        let property_array_index = match encoding::decode_context_unsigned(&data[pos..], 2) {
            Ok((index, consumed)) => {
                pos += consumed;
                Some(index)
            }
            Err(_) => None,
        };
        let device_identifier = match encoding::decode_context_object_id(&data[pos..], 3) {
            Ok((id, consumed)) => {
                pos += consumed;
                Some(id)
            }
            Err(_) => None,
        };
        Ok((
            Self {
                object_identifier,
                property_identifier,
                property_array_index,
                device_identifier,
            },
            pos,
        ))
    }

    pub fn encode_context(&self, tag_number: u8) -> CodecResult<Vec<u8>> {
        let mut buffer = Vec::new();
        encode_opening_tag(&mut buffer, tag_number)?;
        self.encode(&mut buffer)?;
        encode_closing_tag(&mut buffer, tag_number)?;
        Ok(buffer)
    }

    pub fn decode_context(data: &[u8], tag_number: u8) -> CodecResult<(Self, usize)> {
        if data.is_empty() || data[0] != (0x0E | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        let (value, inner_consumed) = Self::decode(&data[1..])?;
        let mut pos = 1 + inner_consumed;
        if pos >= data.len() || data[pos] != (0x0F | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;
        Ok((value, pos))
    }
}

/// BACnetLightingCommand ::= SEQUENCE { operation [0], target-level [1] OPTIONAL,
/// ramp-rate [2] OPTIONAL, step-increment [3] OPTIONAL, fade-time [4] OPTIONAL,
/// priority [5] OPTIONAL }
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingCommand {
    pub operation: u32,
    pub target_level: Option<f32>,
    pub ramp_rate: Option<f32>,
    pub step_increment: Option<f32>,
    pub fade_time: Option<u32>,
    pub priority: Option<u32>,
}

impl LightingCommand {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        buffer.extend_from_slice(&encoding::encode_context_enumerated(self.operation, 0)?);
        if let Some(v) = self.target_level {
            buffer.extend_from_slice(&encode_context_real(v, 1)?);
        }
        if let Some(v) = self.ramp_rate {
            buffer.extend_from_slice(&encode_context_real(v, 2)?);
        }
        if let Some(v) = self.step_increment {
            buffer.extend_from_slice(&encode_context_real(v, 3)?);
        }
        if let Some(v) = self.fade_time {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(v, 4)?);
        }
        if let Some(v) = self.priority {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(v, 5)?);
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let mut pos = 0;
        let (operation, consumed) = encoding::decode_context_enumerated(&data[pos..], 0)?;
        pos += consumed;

        macro_rules! optional_real {
            ($tag:expr) => {
                match decode_context_real(&data[pos..], $tag) {
                    Ok((v, consumed)) => {
                        pos += consumed;
                        Some(v)
                    }
                    Err(_) => None,
                }
            };
        }
        macro_rules! optional_unsigned {
            ($tag:expr) => {
                match encoding::decode_context_unsigned(&data[pos..], $tag) {
                    Ok((v, consumed)) => {
                        pos += consumed;
                        Some(v)
                    }
                    Err(_) => None,
                }
            };
        }

        let target_level = optional_real!(1);
        let ramp_rate = optional_real!(2);
        let step_increment = optional_real!(3);
        let fade_time = optional_unsigned!(4);
        let priority = optional_unsigned!(5);

        Ok((
            Self {
                operation,
                target_level,
                ramp_rate,
                step_increment,
                fade_time,
                priority,
            },
            pos,
        ))
    }

    pub fn encode_context(&self, tag_number: u8) -> CodecResult<Vec<u8>> {
        let mut buffer = Vec::new();
        encode_opening_tag(&mut buffer, tag_number)?;
        self.encode(&mut buffer)?;
        encode_closing_tag(&mut buffer, tag_number)?;
        Ok(buffer)
    }

    pub fn decode_context(data: &[u8], tag_number: u8) -> CodecResult<(Self, usize)> {
        if data.is_empty() || data[0] != (0x0E | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        let (value, inner_consumed) = Self::decode(&data[1..])?;
        let mut pos = 1 + inner_consumed;
        if pos >= data.len() || data[pos] != (0x0F | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;
        Ok((value, pos))
    }
}

/// BACnetxyColor pair (CIE 1931 chromaticity), nested inside `ColorCommand`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyColor {
    pub x: f32,
    pub y: f32,
}

/// BACnetColorCommand ::= SEQUENCE { operation [0], target-color [1] OPTIONAL,
/// target-color-temperature [2] OPTIONAL, fade-time [3] OPTIONAL, ramp-rate [4]
/// OPTIONAL, step-increment [5] OPTIONAL }
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCommand {
    pub operation: u32,
    pub target_color: Option<XyColor>,
    pub target_color_temperature: Option<u32>,
    pub fade_time: Option<u32>,
    pub ramp_rate: Option<u32>,
    pub step_increment: Option<f32>,
}

impl ColorCommand {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        buffer.extend_from_slice(&encoding::encode_context_enumerated(self.operation, 0)?);
        if let Some(color) = self.target_color {
            encode_opening_tag(buffer, 1)?;
            buffer.extend_from_slice(&encode_context_real(color.x, 0)?);
            buffer.extend_from_slice(&encode_context_real(color.y, 1)?);
            encode_closing_tag(buffer, 1)?;
        }
        if let Some(v) = self.target_color_temperature {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(v, 2)?);
        }
        if let Some(v) = self.fade_time {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(v, 3)?);
        }
        if let Some(v) = self.ramp_rate {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(v, 4)?);
        }
        if let Some(v) = self.step_increment {
            buffer.extend_from_slice(&encode_context_real(v, 5)?);
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let mut pos = 0;
        let (operation, consumed) = encoding::decode_context_enumerated(&data[pos..], 0)?;
        pos += consumed;

        let target_color = if pos < data.len() && data[pos] == 0x1E {
            pos += 1;
            let (x, consumed) = decode_context_real(&data[pos..], 0)?;
            pos += consumed;
            let (y, consumed) = decode_context_real(&data[pos..], 1)?;
            pos += consumed;
            if pos >= data.len() || data[pos] != 0x1F {
                return Err(EncodingError::InvalidTag);
            }
            pos += 1;
            Some(XyColor { x, y })
        } else {
            None
        };

        let target_color_temperature = match encoding::decode_context_unsigned(&data[pos..], 2) {
            Ok((v, consumed)) => {
                pos += consumed;
                Some(v)
            }
            Err(_) => None,
        };
        let fade_time = match encoding::decode_context_unsigned(&data[pos..], 3) {
            Ok((v, consumed)) => {
                pos += consumed;
                Some(v)
            }
            Err(_) => None,
        };
        let ramp_rate = match encoding::decode_context_unsigned(&data[pos..], 4) {
            Ok((v, consumed)) => {
                pos += consumed;
                Some(v)
            }
            Err(_) => None,
        };
        let step_increment = match decode_context_real(&data[pos..], 5) {
            Ok((v, consumed)) => {
                pos += consumed;
                Some(v)
            }
            Err(_) => None,
        };

        Ok((
            Self {
                operation,
                target_color,
                target_color_temperature,
                fade_time,
                ramp_rate,
                step_increment,
            },
            pos,
        ))
    }

    pub fn encode_context(&self, tag_number: u8) -> CodecResult<Vec<u8>> {
        let mut buffer = Vec::new();
        encode_opening_tag(&mut buffer, tag_number)?;
        self.encode(&mut buffer)?;
        encode_closing_tag(&mut buffer, tag_number)?;
        Ok(buffer)
    }

    pub fn decode_context(data: &[u8], tag_number: u8) -> CodecResult<(Self, usize)> {
        if data.is_empty() || data[0] != (0x0E | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        let (value, inner_consumed) = Self::decode(&data[1..])?;
        let mut pos = 1 + inner_consumed;
        if pos >= data.len() || data[pos] != (0x0F | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;
        Ok((value, pos))
    }
}

/// BACnetHostAddress ::= CHOICE { none [0] NULL, ip-address [1] OCTET STRING, name [2] CharacterString }
#[derive(Debug, Clone, PartialEq)]
pub enum HostAddress {
    None,
    IpAddress(Vec<u8>),
    Name(String),
}

/// BACnetHostNPort ::= SEQUENCE { host [0] BACnetHostAddress, port [1] Unsigned16 }
#[derive(Debug, Clone, PartialEq)]
pub struct HostNPort {
    pub host: HostAddress,
    pub port: u16,
}

impl HostNPort {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        encode_opening_tag(buffer, 0)?;
        match &self.host {
            HostAddress::None => encode_context_tag(buffer, 0, 0)?,
            HostAddress::IpAddress(addr) => {
                buffer.extend_from_slice(&encode_context_octet_string(addr, 1)?);
            }
            HostAddress::Name(name) => {
                buffer.extend_from_slice(&encode_context_character_string(name, 2)?);
            }
        }
        encode_closing_tag(buffer, 0)?;
        buffer.extend_from_slice(&encoding::encode_context_unsigned(self.port as u32, 1)?);
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        if data.is_empty() || data[0] != 0x0E {
            return Err(EncodingError::InvalidTag);
        }
        let mut pos = 1;
        let host = if pos < data.len() && data[pos] == 0x08 {
            pos += 1;
            HostAddress::None
        } else if let Ok((addr, consumed)) = decode_context_octet_string(&data[pos..], 1) {
            pos += consumed;
            HostAddress::IpAddress(addr)
        } else if let Ok((name, consumed)) = decode_context_character_string(&data[pos..], 2) {
            pos += consumed;
            HostAddress::Name(name)
        } else {
            return Err(EncodingError::InvalidTag);
        };
        if pos >= data.len() || data[pos] != 0x0F {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;
        let (port, consumed) = encoding::decode_context_unsigned(&data[pos..], 1)?;
        pos += consumed;
        Ok((
            Self {
                host,
                port: port as u16,
            },
            pos,
        ))
    }

    pub fn encode_context(&self, tag_number: u8) -> CodecResult<Vec<u8>> {
        let mut buffer = Vec::new();
        encode_opening_tag(&mut buffer, tag_number)?;
        self.encode(&mut buffer)?;
        encode_closing_tag(&mut buffer, tag_number)?;
        Ok(buffer)
    }

    pub fn decode_context(data: &[u8], tag_number: u8) -> CodecResult<(Self, usize)> {
        if data.is_empty() || data[0] != (0x0E | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        let (value, inner_consumed) = Self::decode(&data[1..])?;
        let mut pos = 1 + inner_consumed;
        if pos >= data.len() || data[pos] != (0x0F | (tag_number << 4)) {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;
        Ok((value, pos))
    }
}

/// BACnetRecipient ::= CHOICE { device [0] BACnetObjectIdentifier, address [1] BACnetAddress }
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Device((u16, u32)),
    Address {
        network_number: u16,
        mac_address: Vec<u8>,
    },
}

impl Recipient {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        match self {
            Recipient::Device((object_type, instance)) => {
                buffer.extend_from_slice(&encoding::encode_context_object_id(*object_type, *instance, 0)?);
            }
            Recipient::Address {
                network_number,
                mac_address,
            } => {
                encode_opening_tag(buffer, 1)?;
                buffer.extend_from_slice(&encoding::encode_context_unsigned(*network_number as u32, 0)?);
                buffer.extend_from_slice(&encode_context_octet_string(mac_address, 1)?);
                encode_closing_tag(buffer, 1)?;
            }
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        if let Ok((id, consumed)) = encoding::decode_context_object_id(data, 0) {
            return Ok((Recipient::Device(id), consumed));
        }
        if !data.is_empty() && data[0] == 0x1E {
            let mut pos = 1;
            let (network_number, consumed) = encoding::decode_context_unsigned(&data[pos..], 0)?;
            pos += consumed;
            let (mac_address, consumed) = decode_context_octet_string(&data[pos..], 1)?;
            pos += consumed;
            if pos >= data.len() || data[pos] != 0x1F {
                return Err(EncodingError::InvalidTag);
            }
            pos += 1;
            return Ok((
                Recipient::Address {
                    network_number: network_number as u16,
                    mac_address,
                },
                pos,
            ));
        }
        Err(EncodingError::InvalidTag)
    }
}

/// BACnetDestination ::= SEQUENCE { valid-days [0], from-time [1], to-time [2],
/// recipient [3], process-identifier [4], issue-confirmed-notifications [5],
/// transitions [6] }. `valid_days`/`transitions` are bitstrings stored as a
/// single byte mask (BACnetDaysOfWeek / BACnetEventTransitionBits are both
/// seven-or-fewer-bit bitstrings in practice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub valid_days: u8,
    pub from_time: (u8, u8, u8, u8),
    pub to_time: (u8, u8, u8, u8),
    pub recipient: Recipient,
    pub process_identifier: u32,
    pub issue_confirmed_notifications: bool,
    pub transitions: u8,
}

impl Destination {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        buffer.extend_from_slice(&encode_context_octet_string(&[self.valid_days], 0)?);
        buffer.extend_from_slice(&encode_context_time(self.from_time, 1)?);
        buffer.extend_from_slice(&encode_context_time(self.to_time, 2)?);
        encode_opening_tag(buffer, 3)?;
        self.recipient.encode(buffer)?;
        encode_closing_tag(buffer, 3)?;
        buffer.extend_from_slice(&encoding::encode_context_unsigned(self.process_identifier, 4)?);
        buffer.extend_from_slice(&encode_context_boolean(self.issue_confirmed_notifications, 5)?);
        buffer.extend_from_slice(&encode_context_octet_string(&[self.transitions], 6)?);
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let mut pos = 0;
        let (valid_days_bytes, consumed) = decode_context_octet_string(&data[pos..], 0)?;
        pos += consumed;
        let valid_days = *valid_days_bytes.first().unwrap_or(&0);

        let (from_time, consumed) = decode_context_time(&data[pos..], 1)?;
        pos += consumed;
        let (to_time, consumed) = decode_context_time(&data[pos..], 2)?;
        pos += consumed;

        if pos >= data.len() || data[pos] != 0x3E {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;
        let (recipient, consumed) = Recipient::decode(&data[pos..])?;
        pos += consumed;
        if pos >= data.len() || data[pos] != 0x3F {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;

        let (process_identifier, consumed) = encoding::decode_context_unsigned(&data[pos..], 4)?;
        pos += consumed;
        let (issue_confirmed_notifications, consumed) = decode_context_boolean(&data[pos..], 5)?;
        pos += consumed;
        let (transitions_bytes, consumed) = decode_context_octet_string(&data[pos..], 6)?;
        pos += consumed;
        let transitions = *transitions_bytes.first().unwrap_or(&0);

        Ok((
            Self {
                valid_days,
                from_time,
                to_time,
                recipient,
                process_identifier,
                issue_confirmed_notifications,
                transitions,
            },
            pos,
        ))
    }
}

/// BACnetDeviceObjectReference ::= SEQUENCE { device-identifier [0] OPTIONAL, object-identifier [1] }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceObjectReference {
    pub device_identifier: Option<(u16, u32)>,
    pub object_identifier: (u16, u32),
}

/// BACnetAccessRule ::= SEQUENCE { time-range-specifier [0], time-range [1]
/// OPTIONAL, location-specifier [2], location [3] OPTIONAL }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub time_range_specifier: u32,
    pub time_range: Option<DeviceObjectPropertyReference>,
    pub location_specifier: u32,
    pub location: Option<DeviceObjectReference>,
}

impl AccessRule {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        buffer.extend_from_slice(&encoding::encode_context_enumerated(self.time_range_specifier, 0)?);
        if let Some(ref time_range) = self.time_range {
            buffer.extend_from_slice(&time_range.encode_context(1)?);
        }
        buffer.extend_from_slice(&encoding::encode_context_enumerated(self.location_specifier, 2)?);
        if let Some(ref location) = self.location {
            encode_opening_tag(buffer, 3)?;
            if let Some((object_type, instance)) = location.device_identifier {
                buffer.extend_from_slice(&encoding::encode_context_object_id(object_type, instance, 0)?);
            }
            buffer.extend_from_slice(&encoding::encode_context_object_id(
                location.object_identifier.0,
                location.object_identifier.1,
                1,
            )?);
            encode_closing_tag(buffer, 3)?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let mut pos = 0;
        let (time_range_specifier, consumed) = encoding::decode_context_enumerated(&data[pos..], 0)?;
        pos += consumed;

        let time_range = match DeviceObjectPropertyReference::decode_context(&data[pos..], 1) {
            Ok((value, consumed)) => {
                pos += consumed;
                Some(value)
            }
            Err(_) => None,
        };

        let (location_specifier, consumed) = encoding::decode_context_enumerated(&data[pos..], 2)?;
        pos += consumed;

        let location = if pos < data.len() && data[pos] == 0x3E {
            pos += 1;
            let device_identifier = match encoding::decode_context_object_id(&data[pos..], 0) {
                Ok((id, consumed)) => {
                    pos += consumed;
                    Some(id)
                }
                Err(_) => None,
            };
            let (object_identifier, consumed) = encoding::decode_context_object_id(&data[pos..], 1)?;
            pos += consumed;
            if pos >= data.len() || data[pos] != 0x3F {
                return Err(EncodingError::InvalidTag);
            }
            pos += 1;
            Some(DeviceObjectReference {
                device_identifier,
                object_identifier,
            })
        } else {
            None
        };

        Ok((
            Self {
                time_range_specifier,
                time_range,
                location_specifier,
                location,
            },
            pos,
        ))
    }
}

/// BACnetAuthenticationFactorFormat ::= SEQUENCE { format-type [0], vendor-id
/// [1] OPTIONAL, vendor-format [2] OPTIONAL }
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticationFactorFormat {
    pub format_type: u32,
    pub vendor_id: Option<u16>,
    pub vendor_format: Option<u32>,
}

impl AuthenticationFactorFormat {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        buffer.extend_from_slice(&encoding::encode_context_enumerated(self.format_type, 0)?);
        if let Some(v) = self.vendor_id {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(v as u32, 1)?);
        }
        if let Some(v) = self.vendor_format {
            buffer.extend_from_slice(&encoding::encode_context_unsigned(v, 2)?);
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let mut pos = 0;
        let (format_type, consumed) = encoding::decode_context_enumerated(&data[pos..], 0)?;
        pos += consumed;
        let vendor_id = match encoding::decode_context_unsigned(&data[pos..], 1) {
            Ok((v, consumed)) => {
                pos += consumed;
                Some(v as u16)
            }
            Err(_) => None,
        };
        let vendor_format = match encoding::decode_context_unsigned(&data[pos..], 2) {
            Ok((v, consumed)) => {
                pos += consumed;
                Some(v)
            }
            Err(_) => None,
        };
        Ok((
            Self {
                format_type,
                vendor_id,
                vendor_format,
            },
            pos,
        ))
    }
}

/// BACnetTimeValue ::= SEQUENCE { time, value ABSTRACT-SYNTAX.&Type }. `value`
/// reuses this module's existing application-tagged `PropertyValue` decoder
/// since the abstract value is encoded with its own primitive application tag,
/// not a context tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeValue {
    pub time: (u8, u8, u8, u8),
    pub value: PropertyValue,
}

impl TimeValue {
    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let (time, consumed) = encoding::decode_time(data)?;
        let mut pos = consumed;
        let (value, consumed) =
            decode_property_value(&data[pos..]).ok_or(EncodingError::InvalidFormat("bad time-value".into()))?;
        pos += consumed;
        Ok((Self { time, value }, pos))
    }
}

/// BACnetPropertyStates ::= CHOICE { ... }. The real standard defines over
/// twenty alternatives sharing this tag space; this covers the ones
/// `GetAlarmSummary`/`GetEventInformation`-style status reporting actually
/// needs, with `Other` preserving anything else instead of failing to decode.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyState {
    BooleanValue(bool),
    BinaryValue(u32),
    EventType(u32),
    Polarity(u32),
    Reliability(u32),
    UnsignedValue(u32),
    Other(u8, Vec<u8>),
}

impl PropertyState {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        match self {
            PropertyState::BooleanValue(v) => {
                buffer.extend_from_slice(&encode_context_boolean(*v, 0)?)
            }
            PropertyState::BinaryValue(v) => {
                buffer.extend_from_slice(&encoding::encode_context_enumerated(*v, 1)?)
            }
            PropertyState::EventType(v) => {
                buffer.extend_from_slice(&encoding::encode_context_enumerated(*v, 6)?)
            }
            PropertyState::Polarity(v) => {
                buffer.extend_from_slice(&encoding::encode_context_enumerated(*v, 10)?)
            }
            PropertyState::Reliability(v) => {
                buffer.extend_from_slice(&encoding::encode_context_enumerated(*v, 13)?)
            }
            PropertyState::UnsignedValue(v) => {
                buffer.extend_from_slice(&encoding::encode_context_unsigned(*v, 14)?)
            }
            PropertyState::Other(tag, bytes) => {
                buffer.extend_from_slice(&encode_context_octet_string(bytes, *tag)?)
            }
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let (tag_number, _, _) = decode_context_tag(data)?;
        match tag_number {
            0 => decode_context_boolean(data, 0).map(|(v, c)| (PropertyState::BooleanValue(v), c)),
            1 => encoding::decode_context_enumerated(data, 1).map(|(v, c)| (PropertyState::BinaryValue(v), c)),
            6 => encoding::decode_context_enumerated(data, 6).map(|(v, c)| (PropertyState::EventType(v), c)),
            10 => encoding::decode_context_enumerated(data, 10).map(|(v, c)| (PropertyState::Polarity(v), c)),
            13 => encoding::decode_context_enumerated(data, 13).map(|(v, c)| (PropertyState::Reliability(v), c)),
            14 => encoding::decode_context_unsigned(data, 14).map(|(v, c)| (PropertyState::UnsignedValue(v), c)),
            other => {
                decode_context_octet_string(data, other).map(|(b, c)| (PropertyState::Other(other, b), c))
            }
        }
    }
}

/// BACnetAuditLogRecord ::= SEQUENCE { timestamp [0] BACnetTimeStamp, log-datum
/// [1] CHOICE {...} }. `log-datum` here covers the primitive-value
/// alternatives; `Other` preserves the rest of the real choice set.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditLogDatum {
    Boolean(bool),
    Real(f32),
    Enumerated(u32),
    Unsigned(u32),
    Signed(i32),
    Other(u8, Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogRecord {
    pub timestamp: TimeStamp,
    pub log_datum: AuditLogDatum,
}

impl AuditLogRecord {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> CodecResult<()> {
        buffer.extend_from_slice(&self.timestamp.encode_context(0)?);
        encode_opening_tag(buffer, 1)?;
        match &self.log_datum {
            AuditLogDatum::Boolean(v) => buffer.extend_from_slice(&encode_context_boolean(*v, 1)?),
            AuditLogDatum::Real(v) => buffer.extend_from_slice(&encode_context_real(*v, 2)?),
            AuditLogDatum::Enumerated(v) => {
                buffer.extend_from_slice(&encoding::encode_context_enumerated(*v, 3)?)
            }
            AuditLogDatum::Unsigned(v) => {
                buffer.extend_from_slice(&encoding::encode_context_unsigned(*v, 4)?)
            }
            AuditLogDatum::Signed(v) => buffer.extend_from_slice(&encode_context_signed(*v, 5)?),
            AuditLogDatum::Other(tag, bytes) => {
                buffer.extend_from_slice(&encode_context_octet_string(bytes, *tag)?)
            }
        }
        encode_closing_tag(buffer, 1)?;
        Ok(())
    }

    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let (timestamp, consumed) = TimeStamp::decode_context(data, 0)?;
        let mut pos = consumed;

        if pos >= data.len() || data[pos] != 0x1E {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;

        let (tag_number, _, _) = decode_context_tag(&data[pos..])?;
        let (log_datum, consumed) = match tag_number {
            1 => decode_context_boolean(&data[pos..], 1).map(|(v, c)| (AuditLogDatum::Boolean(v), c))?,
            2 => decode_context_real(&data[pos..], 2).map(|(v, c)| (AuditLogDatum::Real(v), c))?,
            3 => encoding::decode_context_enumerated(&data[pos..], 3)
                .map(|(v, c)| (AuditLogDatum::Enumerated(v), c))?,
            4 => encoding::decode_context_unsigned(&data[pos..], 4)
                .map(|(v, c)| (AuditLogDatum::Unsigned(v), c))?,
            5 => decode_context_signed(&data[pos..], 5).map(|(v, c)| (AuditLogDatum::Signed(v), c))?,
            other => decode_context_octet_string(&data[pos..], other)
                .map(|(b, c)| (AuditLogDatum::Other(other, b), c))?,
        };
        pos += consumed;

        if pos >= data.len() || data[pos] != 0x1F {
            return Err(EncodingError::InvalidTag);
        }
        pos += 1;

        Ok((Self { timestamp, log_datum }, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_real() {
        // Test encoding of 23.5
        let data = [0x44, 0x41, 0xBC, 0x00, 0x00];
        let (value, consumed) = decode_real(&data).unwrap();
        assert_eq!(consumed, 5);
        if let PropertyValue::Real(f) = value {
            assert!((f - 23.5).abs() < 0.01);
        } else {
            panic!("Expected Real value");
        }
    }

    #[test]
    fn test_decode_boolean() {
        // Test true
        let data = [0x11, 0x01];
        let (value, consumed) = decode_boolean(&data).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(value, PropertyValue::Boolean(true));

        // Test false
        let data = [0x11, 0x00];
        let (value, consumed) = decode_boolean(&data).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(value, PropertyValue::Boolean(false));
    }

    #[test]
    fn test_decode_unsigned() {
        // Test 1-byte unsigned
        let data = [0x21, 0x7B]; // 123
        let (value, consumed) = decode_unsigned(&data).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(value, PropertyValue::Unsigned(123));

        // Test 2-byte unsigned
        let data = [0x22, 0x01, 0x2C]; // 300
        let (value, consumed) = decode_unsigned(&data).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(value, PropertyValue::Unsigned(300));
    }

    #[test]
    fn test_decode_character_string() {
        // Test simple string "Hello"
        let data = [0x75, 0x06, 0x00, b'H', b'e', b'l', b'l', b'o'];
        let (value, consumed) = decode_character_string(&data).unwrap();
        assert_eq!(consumed, 8);
        if let PropertyValue::CharacterString(s) = value {
            assert_eq!(s, "Hello");
        } else {
            panic!("Expected CharacterString value");
        }
    }

    #[test]
    fn test_decode_enumerated() {
        // Test enumerated value 42
        let data = [0x91, 0x2A];
        let (value, consumed) = decode_enumerated(&data).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(value, PropertyValue::Enumerated(42));
    }

    #[test]
    fn test_decode_object_identifier() {
        // Test device object with instance 123
        let data = [0xC4, 0x02, 0x00, 0x00, 0x7B];
        let (value, consumed) = decode_object_identifier(&data).unwrap();
        assert_eq!(consumed, 5);
        if let PropertyValue::ObjectIdentifier(obj_type, instance) = value {
            assert_eq!(obj_type, 8); // Device object type
            assert_eq!(instance, 123);
        } else {
            panic!("Expected ObjectIdentifier value");
        }
    }

    #[test]
    fn test_property_value_display() {
        assert_eq!(PropertyValue::Real(23.45).as_display_string(), "23.45");
        assert_eq!(PropertyValue::Boolean(true).as_display_string(), "True");
        assert_eq!(PropertyValue::Unsigned(42).as_display_string(), "42");
        assert_eq!(PropertyValue::CharacterString("Test".to_string()).as_display_string(), "Test");
    }

    #[test]
    fn test_decode_units() {
        // Test degrees Celsius
        let data = [0x91, 62];
        let (units, consumed) = decode_units(&data).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(units, "degrees-celsius");

        // Test kilowatts
        let data = [0x91, 115];
        let (units, consumed) = decode_units(&data).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(units, "kilowatts");

        // Test amperes
        let data = [0x91, 23];
        let (units, consumed) = decode_units(&data).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(units, "amperes");

        // Test cubic-feet-per-minute
        let data = [0x91, 94];
        let (units, consumed) = decode_units(&data).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(units, "cubic-feet-per-minute");
    }

    #[test]
    fn test_get_unit_id() {
        assert_eq!(get_unit_id("degrees-celsius"), Some(62));
        assert_eq!(get_unit_id("kilowatts"), Some(115));
        assert_eq!(get_unit_id("amperes"), Some(23));
        assert_eq!(get_unit_id("cubic-feet-per-minute"), Some(94));
        assert_eq!(get_unit_id("percent"), Some(1));
        assert_eq!(get_unit_id("nonexistent-unit"), None);
    }

    #[test]
    fn test_week_n_day_round_trip() {
        let value = WeekNDay {
            month: 3,
            week_of_month: 2,
            day_of_week: 5,
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = WeekNDay::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);

        let context = value.encode_context(2).unwrap();
        let (decoded, consumed) = WeekNDay::decode_context(&context, 2).unwrap();
        assert_eq!(consumed, context.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_time_stamp_round_trip() {
        let time = TimeStamp::Time((10, 30, 0, 0));
        let mut buffer = Vec::new();
        time.encode(&mut buffer).unwrap();
        let (decoded, consumed) = TimeStamp::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, time);

        let seq = TimeStamp::SequenceNumber(42);
        let mut buffer = Vec::new();
        seq.encode(&mut buffer).unwrap();
        let (decoded, _) = TimeStamp::decode(&buffer).unwrap();
        assert_eq!(decoded, seq);

        let date_time = TimeStamp::DateTime {
            date: (2024, 6, 15, 6),
            time: (8, 0, 0, 0),
        };
        let context = date_time.encode_context(3).unwrap();
        let (decoded, consumed) = TimeStamp::decode_context(&context, 3).unwrap();
        assert_eq!(consumed, context.len());
        assert_eq!(decoded, date_time);
    }

    #[test]
    fn test_property_reference_round_trip() {
        let value = PropertyReference {
            property_identifier: 85,
            property_array_index: Some(3),
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = PropertyReference::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);

        let without_index = PropertyReference {
            property_identifier: 85,
            property_array_index: None,
        };
        let mut buffer = Vec::new();
        without_index.encode(&mut buffer).unwrap();
        let (decoded, consumed) = PropertyReference::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, without_index);
    }

    #[test]
    fn test_device_object_property_reference_round_trip() {
        let value = DeviceObjectPropertyReference {
            object_identifier: (0, 1),
            property_identifier: 85,
            property_array_index: None,
            device_identifier: Some((8, 100)),
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = DeviceObjectPropertyReference::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_lighting_command_round_trip() {
        let value = LightingCommand {
            operation: 1,
            target_level: Some(75.0),
            ramp_rate: None,
            step_increment: None,
            fade_time: Some(500),
            priority: Some(8),
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = LightingCommand::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_color_command_round_trip() {
        let value = ColorCommand {
            operation: 0,
            target_color: Some(XyColor { x: 0.31, y: 0.32 }),
            target_color_temperature: None,
            fade_time: Some(1000),
            ramp_rate: None,
            step_increment: None,
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = ColorCommand::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_host_n_port_round_trip() {
        let ip = HostNPort {
            host: HostAddress::IpAddress(vec![192, 168, 1, 10]),
            port: 47808,
        };
        let mut buffer = Vec::new();
        ip.encode(&mut buffer).unwrap();
        let (decoded, consumed) = HostNPort::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, ip);

        let none_host = HostNPort {
            host: HostAddress::None,
            port: 47808,
        };
        let mut buffer = Vec::new();
        none_host.encode(&mut buffer).unwrap();
        let (decoded, consumed) = HostNPort::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, none_host);

        let name_host = HostNPort {
            host: HostAddress::Name("bacnet.example".to_string()),
            port: 47808,
        };
        let mut buffer = Vec::new();
        name_host.encode(&mut buffer).unwrap();
        let (decoded, consumed) = HostNPort::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, name_host);
    }

    #[test]
    fn test_recipient_round_trip() {
        let device = Recipient::Device((8, 100));
        let mut buffer = Vec::new();
        device.encode(&mut buffer).unwrap();
        let (decoded, consumed) = Recipient::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, device);

        let address = Recipient::Address {
            network_number: 5,
            mac_address: vec![0xC0, 0xA8, 0x01, 0x0A, 0xBA, 0xC0],
        };
        let mut buffer = Vec::new();
        address.encode(&mut buffer).unwrap();
        let (decoded, consumed) = Recipient::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, address);
    }

    #[test]
    fn test_destination_round_trip() {
        let value = Destination {
            valid_days: 0x7F,
            from_time: (0, 0, 0, 0),
            to_time: (23, 59, 59, 99),
            recipient: Recipient::Device((8, 100)),
            process_identifier: 1,
            issue_confirmed_notifications: true,
            transitions: 0x07,
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = Destination::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_access_rule_round_trip() {
        let value = AccessRule {
            time_range_specifier: 1,
            time_range: None,
            location_specifier: 0,
            location: Some(DeviceObjectReference {
                device_identifier: None,
                object_identifier: (3, 5),
            }),
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = AccessRule::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_authentication_factor_format_round_trip() {
        let value = AuthenticationFactorFormat {
            format_type: 1,
            vendor_id: Some(260),
            vendor_format: None,
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = AuthenticationFactorFormat::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_time_value_decode() {
        let mut buffer = Vec::new();
        encoding::encode_time(&mut buffer, 14, 30, 0, 0).unwrap();
        encoding::encode_real(&mut buffer, 21.5).unwrap();

        let (decoded, consumed) = TimeValue::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded.time, (14, 30, 0, 0));
        assert_eq!(decoded.value, PropertyValue::Real(21.5));
    }

    #[test]
    fn test_property_state_round_trip() {
        let value = PropertyState::Reliability(2);
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = PropertyState::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_audit_log_record_round_trip() {
        let value = AuditLogRecord {
            timestamp: TimeStamp::SequenceNumber(7),
            log_datum: AuditLogDatum::Real(42.0),
        };
        let mut buffer = Vec::new();
        value.encode(&mut buffer).unwrap();
        let (decoded, consumed) = AuditLogRecord::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, value);
    }
}