use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use log::info;
use xz::bufread::XzDecoder;

use crate::config::UserConfig;
use crate::data::{Building, PolygonFilter};
use crate::errors::Result;
use crate::osm_model;

use super::Etl;

pub const ETL_NAME: &str = "parse_osm";
pub const OUTPUT_FILE_NAME: &str = "buildings.json";

pub struct ParseOsmEtl {
    data_path: PathBuf,
    filter: Option<PolygonFilter>,
}

impl ParseOsmEtl {
    pub fn new(config: &UserConfig) -> Result<ParseOsmEtl> {
        Ok(ParseOsmEtl {
            data_path: PathBuf::from(&config.data_path),
            filter: config.polygon_filter()?,
        })
    }

    fn is_compressed(&self) -> bool {
        self.data_path.extension().map_or(false, |ext| ext == "xz")
    }

    fn read_document(&self) -> Result<Vec<u8>> {
        if self.is_compressed() {
            let file_reader = BufReader::new(File::open(&self.data_path)?);
            let mut xz_reader = XzDecoder::new(file_reader);
            let mut document = Vec::new();
            xz_reader.read_to_end(&mut document)?;
            Ok(document)
        } else {
            Ok(fs::read(&self.data_path)?)
        }
    }
}

impl Etl for ParseOsmEtl {
    type Input = Vec<u8>;
    type Output = Vec<Building>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn output_file_name(&self) -> &str {
        OUTPUT_FILE_NAME
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let document = self.read_document()?;
        info!(
            etl_name = ETL_NAME,
            bytes = document.len(),
            compressed = self.is_compressed();
            "Read OSM document"
        );
        Ok(document)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        osm_model::parse(&input, self.filter.as_ref())
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let output_file = BufWriter::new(File::create(dir.join(OUTPUT_FILE_NAME))?);
        serde_json::to_writer(output_file, &output)?;
        Ok(())
    }
}
