//! Shared fixtures: a small DNE Basico package as a directory, a ZIP file
//! and a ZIP file wrapping the ZIP file.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// CEP of the street every test looks up
pub const SEEDED_CEP: &str = "11111111";

/// Rows the fixture contributes to the unified table, by source
pub const STREET_CEPS: u64 = 3;
pub const LOCALITY_CEPS: u64 = 1;
pub const SUBORDINATE_LOCALITY_CEPS: u64 = 1;
pub const COMMUNITY_MAILBOX_CEPS: u64 = 2;
pub const LARGE_USER_CEPS: u64 = 1;
pub const OPERATIONAL_UNIT_CEPS: u64 = 1;
pub const UNIFIED_CEPS: u64 = 9;

/// Name of the inner archive inside the outer one
pub const INNER_ZIP_NAME: &str = "eDNE_Basico_25051.zip";

/// Data files of the package, as UTF-8 text.
///
/// `log_localidade` lists a district before its municipality so loading
/// depends on parents-first ordering.
pub fn dne_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ECT_PAIS.TXT", "BR@BRA@Brasil@Brazil@Brésil@BR\n"),
        ("LOG_FAIXA_UF.TXT", "SP@01000000@19999999\n"),
        (
            "LOG_LOCALIDADE.TXT",
            "3@SP@Distrito Um@33333333@0@D@1@D Um@\n\
             1@SP@São Paulo@@1@M@@S Paulo@3550308\n\
             2@SP@Pequena@22222222@0@M@@Pequena@3500001\n\
             4@SP@Sem Código@44444444@0@M@@Sem Cod@\n",
        ),
        (
            "LOG_BAIRRO.TXT",
            "10@SP@1@Centro@Centro\n\
             11@SP@1@Sé@Sé\n",
        ),
        (
            "LOG_CPC.TXT",
            "200@SP@2@CPC Pequena@Rua Um, 10@55555555\n\
             201@SP@3@CPC Distrito@Rua Dois@55555556\n\
             202@SP@4@CPC Sem Código@Rua Três@55555557\n",
        ),
        ("LOG_FAIXA_LOCALIDADE.TXT", "1@01000000@05999999@T\n"),
        ("LOG_VAR_LOC.TXT", "1@1@Sampa\n"),
        ("LOG_FAIXA_BAIRRO.TXT", "10@01001000@01001999\n"),
        ("LOG_FAIXA_CPC.TXT", "200@000001@000100\n"),
        (
            "LOG_LOGRADOURO_SP.TXT",
            "100@SP@1@10@@da Sé@@11111111@Praça@S@Pça da Sé\n\
             101@SP@1@11@@Direita@@11111112@Rua@N@R Direita\n",
        ),
        (
            "LOG_LOGRADOURO_MG.TXT",
            "\n102@SP@1@10@@Boa Vista@@11111113@Rua@S@R Boa Vista\n\n",
        ),
        ("LOG_VAR_BAI.TXT", "10@1@Centro Velho\n"),
        (
            "LOG_GRANDE_USUARIO.TXT",
            "300@SP@1@10@100@Banco Grande@Praça da Sé, 111@66666666@Bco Grande\n\
             301@SP@1@10@@Duplicado@Rua X@11111111@\n",
        ),
        ("LOG_NUM_SEC.TXT", "100@1@99@I\n"),
        (
            "LOG_UNID_OPER.TXT",
            "400@SP@1@11@101@AC Direita@Rua Direita, 50@77777777@S@AC Dir\n",
        ),
        ("LOG_VAR_LOG.TXT", "100@1@Largo@da Sé\n"),
        ("LOG_FAIXA_UOP.TXT", "400@1@999\n"),
    ]
}

/// Text encoded the way the package ships it
pub fn encode(text: &str) -> Vec<u8> {
    encoding_rs::WINDOWS_1252.encode(text).0.into_owned()
}

/// Writes the data files straight into `dir`.
pub fn write_dne_dir(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    for (name, content) in dne_files() {
        fs::write(dir.join(name), encode(content)).unwrap();
    }
}

/// Writes the package layout under `dir`: a readme plus a `Delimitado`
/// directory with the data files.
pub fn write_dne_package_dir(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("LEIAME.TXT"), encode("Leia-me\n")).unwrap();
    write_dne_dir(&dir.join("Delimitado"));
}

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Bytes of a basic package ZIP file.
pub fn dne_zip_bytes() -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("LEIAME.TXT", options()).unwrap();
    zip.write_all(&encode("Leia-me\n")).unwrap();
    zip.add_directory("Delimitado/", options()).unwrap();
    for (name, content) in dne_files() {
        zip.start_file(format!("Delimitado/{}", name), options())
            .unwrap();
        zip.write_all(&encode(content)).unwrap();
    }
    zip.start_file("Fixo/LOG_BAIRRO.TXT", options()).unwrap();
    zip.write_all(b"fixed width layout").unwrap();
    zip.finish().unwrap().into_inner()
}

/// Bytes of an archive wrapping the basic package ZIP file.
pub fn outer_zip_bytes() -> Vec<u8> {
    outer_zip_bytes_with_inner(&dne_zip_bytes())
}

/// Bytes of an archive wrapping `inner` under the basic package name.
pub fn outer_zip_bytes_with_inner(inner: &[u8]) -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("LEIAME.pdf", options()).unwrap();
    zip.write_all(b"%PDF").unwrap();
    zip.start_file(INNER_ZIP_NAME, options()).unwrap();
    zip.write_all(inner).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Bytes of a ZIP file holding only unrelated entries.
pub fn unrelated_zip_bytes() -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("notes/readme.md", options()).unwrap();
    zip.write_all(b"nothing to see").unwrap();
    zip.finish().unwrap().into_inner()
}

/// Writes the basic package ZIP file to `dir/name`.
pub fn write_dne_zip(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, dne_zip_bytes()).unwrap();
    path
}

/// Writes the wrapping archive to `dir/name`.
pub fn write_outer_zip(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, outer_zip_bytes()).unwrap();
    path
}

/// Writes a wrapping archive holding `inner` as its basic package.
pub fn write_outer_zip_with_inner(dir: &Path, name: &str, inner: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, outer_zip_bytes_with_inner(inner)).unwrap();
    path
}

/// Writes a ZIP file holding only unrelated entries.
pub fn write_unrelated_zip(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, unrelated_zip_bytes()).unwrap();
    path
}

/// Number of entries left in `dir`.
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
