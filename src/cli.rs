use crate::format::{validate_compression, DEFAULT_COMPRESSION};
use crate::smooth::BorderMode;
use crate::warp::Resampling;
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};

fn parse_compression(value: &str) -> Result<String, String> {
    let compression = value.to_ascii_uppercase();
    validate_compression(&compression).map_err(|e| e.to_string())?;
    Ok(compression)
}

#[derive(Parser, Debug)]
#[command(name = "disagg-grid")]
#[command(about = "Align low and high resolution rasters and aggregate pixel groups")]
#[command(version)]
pub struct Cli {
    /// Number of threads (default: all available)
    #[arg(short, long, global = true, value_name = "N")]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// GeoTIFF compression (DEFLATE, LZW, ZSTD, NONE)
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_COMPRESSION,
        value_parser = parse_compression,
        value_name = "TYPE"
    )]
    pub compression: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reproject and subset a low resolution raster onto a high resolution raster's grid
    Align {
        /// High resolution raster defining projection and extent
        #[arg(long, value_name = "FILE")]
        high: String,

        /// Low resolution raster to align
        #[arg(long, value_name = "FILE")]
        low: String,

        /// Output path (.nc for netCDF, anything else GeoTIFF)
        #[arg(short, long, value_name = "FILE")]
        output: String,

        #[arg(short, long, value_enum, default_value_t = Resampling::Bilinear)]
        resampling: Resampling,
    },

    /// Mean and standard deviation of high resolution pixels per low resolution pixel
    Aggregate {
        #[arg(long, value_name = "FILE")]
        high: String,

        #[arg(long, value_name = "FILE")]
        low: String,

        /// Output for the per band means
        #[arg(long, value_name = "FILE")]
        mean_output: String,

        /// Output for the per band standard deviations
        #[arg(long, value_name = "FILE")]
        std_output: String,

        /// Also write the aligned low resolution raster here
        #[arg(long, value_name = "FILE")]
        low_output: Option<String>,

        /// The low resolution raster is already aligned with the high resolution one
        #[arg(long)]
        aligned: bool,

        #[arg(short, long, value_enum, default_value_t = Resampling::Bilinear)]
        resampling: Resampling,

        /// Tile edge in low resolution pixels
        #[arg(long, default_value_t = 256, value_name = "PIXELS")]
        tile_size: usize,
    },

    /// Resample a raster onto the grid of a template raster
    Resample {
        #[arg(short, long, value_name = "FILE")]
        input: String,

        #[arg(long, value_name = "FILE")]
        template: String,

        #[arg(short, long, value_name = "FILE")]
        output: String,

        #[arg(short, long, value_enum, default_value_t = Resampling::Average)]
        resampling: Resampling,
    },

    /// 3x3 binomial smoothing of one band, leaving no-data cells untouched
    Smooth {
        #[arg(short, long, value_name = "FILE")]
        input: String,

        #[arg(short, long, value_name = "FILE")]
        output: String,

        /// Band to smooth (1-based)
        #[arg(
            short,
            long,
            default_value_t = 1,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..)
        )]
        band: usize,

        #[arg(long, value_enum, default_value_t = BorderMode::Replicate)]
        border: BorderMode,

        /// Tile edge in pixels
        #[arg(long, default_value_t = 1024, value_name = "PIXELS")]
        tile_size: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_aggregate_defaults() {
        let cli = Cli::try_parse_from([
            "disagg-grid",
            "aggregate",
            "--high",
            "s2.tif",
            "--low",
            "lst.tif",
            "--mean-output",
            "mean.tif",
            "--std-output",
            "std.nc",
        ])
        .unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Command::Aggregate {
                resampling,
                tile_size,
                aligned,
                low_output,
                ..
            } => {
                assert_eq!(resampling, Resampling::Bilinear);
                assert_eq!(tile_size, 256);
                assert!(!aligned);
                assert!(low_output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_smooth_with_global_flags() {
        let cli = Cli::try_parse_from([
            "disagg-grid",
            "smooth",
            "-i",
            "in.tif",
            "-o",
            "out.tif",
            "--border",
            "mirror",
            "--threads",
            "4",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.threads, Some(4));
        assert!(cli.verbose);
        match cli.command {
            Command::Smooth { border, band, .. } => {
                assert_eq!(border, BorderMode::Mirror);
                assert_eq!(band, 1);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_resampling_names() {
        let cli = Cli::try_parse_from([
            "disagg-grid",
            "resample",
            "-i",
            "a.tif",
            "--template",
            "b.tif",
            "-o",
            "c.tif",
            "-r",
            "nearest",
        ])
        .unwrap();
        match cli.command {
            Command::Resample { resampling, .. } => assert_eq!(resampling, Resampling::Nearest),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_band_zero_rejected() {
        let result = Cli::try_parse_from([
            "disagg-grid",
            "smooth",
            "-i",
            "in.tif",
            "-o",
            "out.tif",
            "--band",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_compression_flag() {
        let base = ["disagg-grid", "smooth", "-i", "in.tif", "-o", "out.tif"];
        let cli = Cli::try_parse_from(base).unwrap();
        assert_eq!(cli.compression, "DEFLATE");

        let cli = Cli::try_parse_from(base.iter().copied().chain(["--compression", "lzw"]))
            .unwrap();
        assert_eq!(cli.compression, "LZW");

        let result = Cli::try_parse_from(base.iter().copied().chain(["--compression", "jpeg"]));
        assert!(result.is_err());
    }
}
