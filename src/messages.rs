//! User-visible strings
//!
//! The device page ships in Portuguese; English is available for operators
//! who run the console elsewhere.

use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    Portuguese,
    English,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown language '{0}', expected 'pt' or 'en'")]
pub struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pt" | "pt-br" => Ok(Self::Portuguese),
            "en" => Ok(Self::English),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// Catalogue of every string the page renders
#[derive(Debug)]
pub struct Messages {
    pub actuator_on: &'static str,
    pub actuator_off: &'static str,
    pub select_firmware_file: &'static str,
    pub uploading: &'static str,
    pub upload_failed: &'static str,
    pub rebooting_in: &'static str,
    pub connecting: &'static str,
    pub connection_failed: &'static str,
    pub connected: &'static str,
    pub empty_ssid: &'static str,
    pub empty_password: &'static str,
    pub waiting_for_sync: &'static str,
    pub file_label: &'static str,
    pub size_label: &'static str,
    pub labels: Labels,
}

#[derive(Debug)]
pub struct Labels {
    pub temperature: &'static str,
    pub distance: &'static str,
    pub actuator: &'static str,
    pub local_time: &'static str,
    pub ap_ssid: &'static str,
    pub connection: &'static str,
    pub firmware: &'static str,
    pub update: &'static str,
    pub wifi: &'static str,
}

static PORTUGUESE: Messages = Messages {
    actuator_on: "LIGADO",
    actuator_off: "DESLIGADO",
    select_firmware_file: "Selecione um arquivo .bin primeiro",
    uploading: "Enviando {name}, aguarde...",
    upload_failed: "Erro no Upload!",
    rebooting_in: "Sucesso! Reiniciando em: {seconds}s",
    connecting: "Conectando...",
    connection_failed: "Falha na conexão. Verifique a senha.",
    connected: "Conectado com Sucesso!",
    empty_ssid: "SSID não pode ser vazio.",
    empty_password: "Senha não pode ser vazia.",
    waiting_for_sync: "Aguardando Sync...",
    file_label: "Arquivo",
    size_label: "Tamanho",
    labels: Labels {
        temperature: "Temperatura",
        distance: "Distância",
        actuator: "Atuador",
        local_time: "Hora local",
        ap_ssid: "Rede",
        connection: "Conexão",
        firmware: "Firmware",
        update: "Atualização",
        wifi: "WiFi",
    },
};

static ENGLISH: Messages = Messages {
    actuator_on: "ON",
    actuator_off: "OFF",
    select_firmware_file: "Select a .bin file first",
    uploading: "Uploading {name}, please wait...",
    upload_failed: "Upload failed!",
    rebooting_in: "Success! Rebooting in: {seconds}s",
    connecting: "Connecting...",
    connection_failed: "Connection failed. Check the password.",
    connected: "Connected successfully!",
    empty_ssid: "SSID must not be empty.",
    empty_password: "Password must not be empty.",
    waiting_for_sync: "Waiting for sync...",
    file_label: "File",
    size_label: "Size",
    labels: Labels {
        temperature: "Temperature",
        distance: "Distance",
        actuator: "Actuator",
        local_time: "Local time",
        ap_ssid: "Network",
        connection: "Connection",
        firmware: "Firmware",
        update: "Update",
        wifi: "WiFi",
    },
};

impl Messages {
    pub fn for_language(language: Language) -> &'static Messages {
        match language {
            Language::Portuguese => &PORTUGUESE,
            Language::English => &ENGLISH,
        }
    }

    pub fn uploading(&self, name: &str) -> String {
        self.uploading.replace("{name}", name)
    }

    pub fn rebooting_in(&self, seconds: u32) -> String {
        self.rebooting_in.replace("{seconds}", &seconds.to_string())
    }
}
