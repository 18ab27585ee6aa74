use crate::model::SettingsEntry;

macro_rules! panel {
    ($name:expr, $panel:expr, $icon:expr, [$($keyword:expr),* $(,)?]) => {
        SettingsEntry {
            name: $name,
            panel: $panel,
            icon: $icon,
            keywords: &[$($keyword),*],
        }
    };
}

/// Settings panels searchable from the launcher. Keywords are lowercase.
pub static SETTINGS_PANELS: &[SettingsEntry] = &[
    panel!("Wi-Fi", "wifi", "network-wireless-symbolic", ["wireless", "wlan", "hotspot", "network"]),
    panel!("Network", "network", "network-wired-symbolic", ["ethernet", "vpn", "proxy", "ip"]),
    panel!("Bluetooth", "bluetooth", "bluetooth-active-symbolic", ["pair", "headset", "devices"]),
    panel!("Displays", "display", "video-display-symbolic", ["monitor", "resolution", "scale", "night light", "refresh rate"]),
    panel!("Sound", "sound", "audio-speakers-symbolic", ["audio", "volume", "speaker", "microphone", "output"]),
    panel!("Power", "power", "battery-symbolic", ["battery", "suspend", "sleep", "energy"]),
    panel!("Appearance", "background", "preferences-desktop-appearance-symbolic", ["wallpaper", "background", "dark", "theme", "style"]),
    panel!("Notifications", "notifications", "preferences-system-notifications-symbolic", ["do not disturb", "banner", "alerts"]),
    panel!("Search", "search", "preferences-system-search-symbolic", ["index", "locations"]),
    panel!("Multitasking", "multitasking", "preferences-system-windows-symbolic", ["workspaces", "hot corner", "windows"]),
    panel!("Apps", "applications", "preferences-desktop-apps-symbolic", ["permissions", "default", "startup"]),
    panel!("Privacy & Security", "privacy", "preferences-system-privacy-symbolic", ["lock", "screen lock", "location", "camera", "usage"]),
    panel!("Online Accounts", "online-accounts", "goa-panel-symbolic", ["google", "microsoft", "nextcloud", "login"]),
    panel!("Sharing", "sharing", "preferences-system-sharing-symbolic", ["remote desktop", "file sharing", "media"]),
    panel!("Mouse & Touchpad", "mouse", "input-mouse-symbolic", ["pointer", "scroll", "click", "trackpad"]),
    panel!("Keyboard", "keyboard", "input-keyboard-symbolic", ["shortcuts", "layout", "input source", "keys"]),
    panel!("Printers", "printers", "printer-symbolic", ["print", "scanner"]),
    panel!("Removable Media", "removable-media", "media-removable-symbolic", ["usb", "autorun", "cd", "dvd"]),
    panel!("Color", "color", "preferences-color-symbolic", ["calibration", "profile", "icc"]),
    panel!("Region & Language", "region", "preferences-desktop-locale-symbolic", ["language", "locale", "formats", "units"]),
    panel!("Accessibility", "universal-access", "preferences-desktop-accessibility-symbolic", ["zoom", "screen reader", "contrast", "a11y"]),
    panel!("Users", "user-accounts", "system-users-symbolic", ["account", "password", "avatar", "login"]),
    panel!("Date & Time", "datetime", "preferences-system-time-symbolic", ["clock", "timezone", "calendar"]),
    panel!("About", "info-overview", "help-about-symbolic", ["system", "version", "hardware", "device name"]),
];

pub fn find_panel(panel: &str) -> Option<&'static SettingsEntry> {
    SETTINGS_PANELS.iter().find(|entry| entry.panel == panel)
}
