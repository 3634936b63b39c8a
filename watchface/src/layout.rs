//! The closed catalogue of layout element type codes.
//!
//! Each code carries the nominal number of consecutive payloads the element
//! claims from the offset table (10 for digit strips, 12 for month names,
//! and so on). Codes 0xF6..=0xF8 are animation sequences whose real frame
//! count lives in the package's animation-frame slot.

/// One entry of the type-code catalogue.
#[derive(Debug, Clone, Copy)]
pub struct ElementKind {
    pub code: u8,
    pub name: &'static str,
    pub frames: u8,
    pub description: &'static str,
}

/// Digit strips give the width and height of a single digit (0-9).
pub const ELEMENT_KINDS: &[ElementKind] = &[
    ElementKind { code: 0x00, name: "BACKGROUNDS", frames: 10, description: "Background (10 parts of 240x24). May contain example time (will be overwritten). Seen in Type A faces." },
    ElementKind { code: 0x01, name: "BACKGROUND", frames: 1, description: "Background image, usually width and height of screen. Seen in Type B & C faces." },
    ElementKind { code: 0x10, name: "MONTH_NAME", frames: 12, description: "JAN, FEB, MAR, APR, MAY, JUN, JUL, AUG, SEP, OCT, NOV, DEC." },
    ElementKind { code: 0x11, name: "MONTH_NUM", frames: 10, description: "Month, digits." },
    ElementKind { code: 0x12, name: "YEAR", frames: 10, description: "Year, 2 digits, left aligned." },
    ElementKind { code: 0x30, name: "DAY_NUM", frames: 10, description: "Day number of the month, digits." },
    ElementKind { code: 0x40, name: "TIME_H1", frames: 10, description: "Hh:mm" },
    ElementKind { code: 0x41, name: "TIME_H2", frames: 10, description: "hH:mm" },
    ElementKind { code: 0x43, name: "TIME_M1", frames: 10, description: "hh:Mm" },
    ElementKind { code: 0x44, name: "TIME_M2", frames: 10, description: "hh:mM" },
    ElementKind { code: 0x45, name: "TIME_AM", frames: 1, description: "'AM'." },
    ElementKind { code: 0x46, name: "TIME_PM", frames: 1, description: "'PM'." },
    ElementKind { code: 0x60, name: "DAY_NAME", frames: 7, description: "SUN, MON, TUE, WED, THU, FRI, SAT." },
    ElementKind { code: 0x61, name: "DAY_NAME_CN", frames: 7, description: "SUN, MON, TUE, WED, THU, FRI, SAT, chinese symbol option." },
    ElementKind { code: 0x62, name: "STEPS", frames: 10, description: "Step count, left aligned, digits." },
    ElementKind { code: 0x63, name: "STEPS_CA", frames: 10, description: "Step count, centre aligned, digits." },
    ElementKind { code: 0x64, name: "STEPS_RA", frames: 10, description: "Step count, right aligned, digits." },
    ElementKind { code: 0x65, name: "HR", frames: 10, description: "Heart rate, left aligned, digits. (Assumed)." },
    ElementKind { code: 0x66, name: "HR_CA", frames: 10, description: "Heart rate, centre aligned, digits. (Assumed)." },
    ElementKind { code: 0x67, name: "HR_RA", frames: 10, description: "Heart rate, right aligned, digits." },
    ElementKind { code: 0x68, name: "KCAL", frames: 10, description: "kCals, left aligned, digits." },
    ElementKind { code: 0x6B, name: "MONTH_NUM_B", frames: 10, description: "Month, digits, alternate." },
    ElementKind { code: 0x6C, name: "DAY_NUM_B", frames: 10, description: "Day number of the month, digits, alternate." },
    ElementKind { code: 0x70, name: "STEPS_PROGBAR", frames: 11, description: "Steps progress bar 0,10,20...100%. 11 frames." },
    ElementKind { code: 0x71, name: "STEPS_LOGO", frames: 1, description: "Step count, static logo." },
    ElementKind { code: 0x72, name: "STEPS_B", frames: 10, description: "Step count, left aligned, digits, alternate." },
    ElementKind { code: 0x73, name: "STEPS_B_CA", frames: 10, description: "Step count, centre aligned, digits, alternate." },
    ElementKind { code: 0x74, name: "STEPS_B_RA", frames: 10, description: "Step count, right aligned, digits, alternate." },
    ElementKind { code: 0x76, name: "STEPS_GOAL", frames: 1, description: "Step goal, left aligned, digits." },
    ElementKind { code: 0x80, name: "HR_PROGBAR", frames: 11, description: "Heart rate, progress bar 0,10,20...100%. 11 frames." },
    ElementKind { code: 0x81, name: "HR_LOGO", frames: 1, description: "Heart rate, static logo." },
    ElementKind { code: 0x82, name: "HR_B", frames: 10, description: "Heart rate, left aligned, digits, alternate." },
    ElementKind { code: 0x83, name: "HR_B_CA", frames: 10, description: "Heart rate, centre aligned, digits, alternate." },
    ElementKind { code: 0x84, name: "HR_B_RA", frames: 10, description: "Heart rate, right aligned, digits, alternate." },
    ElementKind { code: 0x90, name: "KCAL_PROGBAR", frames: 11, description: "kCals progress bar 0,10,20...100%. 11 frames." },
    ElementKind { code: 0x91, name: "KCAL_LOGO", frames: 1, description: "kCals, static logo." },
    ElementKind { code: 0x92, name: "KCAL_B", frames: 10, description: "kCals, left aligned, digits." },
    ElementKind { code: 0x93, name: "KCAL_B_CA", frames: 10, description: "kCals, centre aligned, digits." },
    ElementKind { code: 0x94, name: "KCAL_B_RA", frames: 10, description: "kCals, right aligned, digits." },
    ElementKind { code: 0xA0, name: "DIST_PROGBAR", frames: 11, description: "Distance progress bar 0,10,20...100%. 11 frames." },
    ElementKind { code: 0xA1, name: "DIST_LOGO", frames: 1, description: "Distance, static logo." },
    ElementKind { code: 0xA2, name: "DIST", frames: 10, description: "Distance, left aligned, digits." },
    ElementKind { code: 0xA3, name: "DIST_CA", frames: 10, description: "Distance, centre aligned, digits." },
    ElementKind { code: 0xA4, name: "DIST_RA", frames: 10, description: "Distance, right aligned, digits." },
    ElementKind { code: 0xA5, name: "DIST_KM", frames: 1, description: "Distance unit 'KM'." },
    ElementKind { code: 0xA6, name: "DIST_MI", frames: 1, description: "Distance unit 'MI'." },
    ElementKind { code: 0xC0, name: "BTLINK_UP", frames: 1, description: "Bluetooth link up / connected." },
    ElementKind { code: 0xC1, name: "BTLINK_DOWN", frames: 1, description: "Bluetooth link down / not connected." },
    ElementKind { code: 0xCE, name: "BATT_IMG", frames: 1, description: "Battery level image." },
    ElementKind { code: 0xD0, name: "BATT_IMG_B", frames: 1, description: "Battery level image, alternate." },
    ElementKind { code: 0xD1, name: "BATT_IMG_C", frames: 1, description: "Battery level image, alternate." },
    ElementKind { code: 0xD2, name: "BATT", frames: 10, description: "Battery level, left aligned, digits. (Assumed)." },
    ElementKind { code: 0xD3, name: "BATT_CA", frames: 10, description: "Battery level, centre aligned, digits." },
    ElementKind { code: 0xD4, name: "BATT_RA", frames: 10, description: "Battery level, right aligned, digits." },
    ElementKind { code: 0xDA, name: "BATT_IMG_D", frames: 1, description: "Battery level image, alternate." },
    ElementKind { code: 0xD8, name: "WEATHER_TEMP_CA", frames: 10, description: "Weather temperature, centre aligned, digits." },
    ElementKind { code: 0xF0, name: "SEPERATOR", frames: 1, description: "Static image used as date or time seperator e.g. / or :." },
    ElementKind { code: 0xF1, name: "HAND_HOUR", frames: 1, description: "Analog time hour hand, at 1200 position." },
    ElementKind { code: 0xF2, name: "HAND_MINUTE", frames: 1, description: "Analog time minute hand, at 1200 position." },
    ElementKind { code: 0xF3, name: "HAND_SEC", frames: 1, description: "Analog time second hand, at 1200 position." },
    ElementKind { code: 0xF4, name: "HAND_PIN_UPPER", frames: 1, description: "Top half of analog time centre pin." },
    ElementKind { code: 0xF5, name: "HAND_PIN_LOWER", frames: 1, description: "Bottom half of analog time centre pin." },
    ElementKind { code: 0xF6, name: "TAP_TO_CHANGE", frames: 3, description: "Series of images. Tap to change. Count is specified by animationFrames." },
    ElementKind { code: 0xF7, name: "ANIMATION", frames: 7, description: "Animation. Count is specified by animationFrames." },
    ElementKind { code: 0xF8, name: "ANIMATION_F8", frames: 10, description: "Animation. Count is specified by animationFrames." },
];

/// True for the codes whose frame count comes from the animation slot.
pub fn is_animation(code: u8) -> bool {
    (0xF6..=0xF8).contains(&code)
}

/// Linear lookup; the table is small enough that nothing fancier pays off.
pub fn kind_by_code(code: u8) -> Option<&'static ElementKind> {
    ELEMENT_KINDS.iter().find(|k| k.code == code)
}

pub fn kind_name(code: u8) -> &'static str {
    kind_by_code(code).map_or("UNKNOWN", |k| k.name)
}

/// Number of payloads an element of `code` claims from the offset table.
pub fn frame_count(code: u8, animation_frames: u16) -> u32 {
    if is_animation(code) && animation_frames != 0 {
        return animation_frames as u32;
    }
    kind_by_code(code).map_or(1, |k| k.frames as u32)
}
