use clap::Parser;
use env_logger::Env;
use log::info;

use disagg_grid::aggregate::{resample_high_res_to_low_res, AggregateOptions};
use disagg_grid::align::{reproject_subset_low_res, resample_to_template};
use disagg_grid::cli::{Cli, Command};
use disagg_grid::error::Result;
use disagg_grid::gdal_warp::GdalWarper;
use disagg_grid::io::{open_raster, save_band, save_img};
use disagg_grid::raster::{RasterField, RasterSource};
use disagg_grid::smooth::{smooth_band, SmoothOptions};

fn band_names(prefix: &str, bands: usize) -> Vec<String> {
    (1..=bands).map(|b| format!("{}_{}", prefix, b)).collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Some(n_threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()
            .expect("Failed to build thread pool");
        info!("Using {} threads", n_threads);
    } else {
        info!("Using all available threads");
    }

    match cli.command {
        Command::Align {
            high,
            low,
            output,
            resampling,
        } => {
            let high_grid = open_raster(&high)?.grid()?;
            let low = open_raster(&low)?;
            let (aligned_low, _) =
                reproject_subset_low_res(&GdalWarper, &high_grid, &low, resampling)?;
            write_raster(&aligned_low, &output, &cli.compression)?;
        }
        Command::Aggregate {
            high,
            low,
            mean_output,
            std_output,
            low_output,
            aligned,
            resampling,
            tile_size,
        } => {
            let high = open_raster(&high)?;
            let low = open_raster(&low)?;
            let low_grid = if aligned {
                low.grid()?
            } else {
                let (aligned_low, plan) =
                    reproject_subset_low_res(&GdalWarper, &high.grid()?, &low, resampling)?;
                if let Some(path) = low_output {
                    write_raster(&aligned_low, &path, &cli.compression)?;
                }
                plan.grid
            };

            let options = AggregateOptions { tile_size };
            let stats = resample_high_res_to_low_res(&high, &low_grid, options)?;
            let bands = stats.mean.dim().2;
            save_img(
                stats.mean.view(),
                &stats.grid.geotransform,
                &stats.grid.projection,
                &mean_output,
                f64::NAN,
                &band_names("mean", bands),
                &cli.compression,
            )?;
            save_img(
                stats.std.view(),
                &stats.grid.geotransform,
                &stats.grid.projection,
                &std_output,
                f64::NAN,
                &band_names("std", bands),
                &cli.compression,
            )?;
        }
        Command::Resample {
            input,
            template,
            output,
            resampling,
        } => {
            let template_grid = open_raster(&template)?.grid()?;
            let source = open_raster(&input)?;
            let resampled = resample_to_template(&GdalWarper, &source, &template_grid, resampling)?;
            write_raster(&resampled, &output, &cli.compression)?;
        }
        Command::Smooth {
            input,
            output,
            band,
            border,
            tile_size,
        } => {
            let source = open_raster(&input)?;
            let grid = source.grid()?;
            let smoothed = smooth_band(
                &source,
                band - 1,
                SmoothOptions { border, tile_size },
            )?;
            save_band(&smoothed, &grid, &output, f64::NAN, &cli.compression)?;
        }
    }

    info!("=== Done! ===");
    Ok(())
}

/// Copy an in-memory raster to `destination`, no-data already mapped to NaN.
fn write_raster<S: RasterSource>(raster: &S, destination: &str, compression: &str) -> Result<()> {
    let field = RasterField::from_source(raster)?;
    let grid = field.descriptor().clone();
    let bands = field.data().dim().2;
    save_img(
        field.data().view(),
        &grid.geotransform,
        &grid.projection,
        destination,
        f64::NAN,
        &band_names("band", bands),
        compression,
    )?;
    Ok(())
}
