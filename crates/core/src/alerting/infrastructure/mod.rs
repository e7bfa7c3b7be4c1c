pub mod command_alert_sound;
