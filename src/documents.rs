//! Rendering of the three specinti documents.
//!
//! Each document references the previous one, so they are built strictly in
//! order: processing, then install config, then ini.
use crate::cli::SetupType;
use crate::config::RunConfig;
use crate::paths::{file_stem, InstallPaths, PROCESSING_FILE};
use crate::render::{parse_yaml, read_yaml, render, write_yaml, Binding};
use crate::resource::{GeneratedDocument, GeneratedDocuments};
use crate::templates;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Where the install-config template comes from.
#[derive(Debug, Clone)]
pub enum BaseConfig {
    Builtin(SetupType),
    File(PathBuf),
}

impl BaseConfig {
    pub fn load(&self) -> Result<Value> {
        match self {
            BaseConfig::Builtin(setup) => parse_yaml(builtin_base_config(*setup), setup.as_str()),
            BaseConfig::File(path) => {
                read_yaml(path).with_context(|| format!("load base config {}", path.display()))
            }
        }
    }
}

fn builtin_base_config(setup: SetupType) -> &'static str {
    match setup {
        SetupType::Alpy600 => templates::CONF_ALPY600_YAML,
        SetupType::Starex2400 => templates::CONF_STAREX2400_YAML,
    }
}

/// Render and persist all three documents.
pub fn build_documents(
    work_dir: &Path,
    config: &RunConfig,
    install: &InstallPaths,
    base: &BaseConfig,
) -> Result<GeneratedDocuments> {
    let processing = build_processing_document(work_dir, config)?;
    let install_config = build_install_config_document(work_dir, &processing, install, base)?;
    let ini = build_ini_document(&install_config, &processing, install)?;
    Ok(GeneratedDocuments {
        processing,
        install_config,
        ini,
    })
}

pub fn build_processing_document(work_dir: &Path, config: &RunConfig) -> Result<GeneratedDocument> {
    let template = parse_yaml(templates::PROCESSING_CONFIG_YAML, "processing template")?;
    let doc = render(&template, &config.bindings()?, "processing document")?;
    persist(&work_dir.join(PROCESSING_FILE), &doc)
}

pub fn build_install_config_document(
    work_dir: &Path,
    processing: &GeneratedDocument,
    install: &InstallPaths,
    base: &BaseConfig,
) -> Result<GeneratedDocument> {
    let template = base.load()?;
    let bindings = [
        Binding::new("WORKING_PATH", work_dir.display().to_string()),
        Binding::new("PROCESSING_FILE", processing.stem.clone()),
    ];
    let doc = render(&template, &bindings, "install config document")?;
    persist(&install.install_config_path(), &doc)
}

pub fn build_ini_document(
    install_config: &GeneratedDocument,
    processing: &GeneratedDocument,
    install: &InstallPaths,
) -> Result<GeneratedDocument> {
    let template = parse_yaml(templates::SPECINTI_INI_YAML, "ini template")?;
    let processing_path = std::path::absolute(&processing.path)
        .with_context(|| format!("resolve {}", processing.path.display()))?;
    let bindings = [
        Binding::new("SPECINTI_CONF_FILE", install_config.stem.clone()),
        Binding::new("PROCESSING_FILE_PATH", processing_path.display().to_string()),
    ];
    let doc = render(&template, &bindings, "ini document")?;
    persist(&install.ini_path(), &doc)
}

fn persist(path: &Path, doc: &Value) -> Result<GeneratedDocument> {
    write_yaml(path, doc)?;
    tracing::info!(path = %path.display(), "wrote generated document");
    Ok(GeneratedDocument {
        path: path.to_path_buf(),
        stem: file_stem(path),
    })
}
