#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    slothorganize_tauri::run();
}
