/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

#[macro_export]
macro_rules! io_error {
    ( $kind:expr, $fmt:literal $(, $($arg:expr),* )? ) =>
    {
        io::Error::new( $kind, format!($fmt, $( $($arg),* )?).as_str())
    }
}
pub use io_error;

//--- macros that are useful to map errors (also to thiserror defined enums)

#[macro_export]
macro_rules! map_to_opaque_error {
    ($from_error:ty => $to_error:ident :: $variant:ident) => {
        impl From<$from_error> for $to_error {
            fn from (e: $from_error)->Self { $to_error :: $variant ( e.to_string()) }
        }
    };
}

/* #region define_cli  ****************************************************************************************/

/// syntactic sugar macro for clap derive based command line interface definition
/// ```ignore
/// define_cli! { ARGS [about="my silly prog"] =
///   verbose: bool        [help="run verbose", long],
///   config: String       [help="pathname of config", long, default_value="blah"],
///   input: String        [help="input filename"]
/// }
///
/// fn main () {
///    check_cli!(ARGS); // makes sure we exit on -h or --help (and do not execute anything until we know ARGS parsed)
///    ...
///    let config = &ARGS.config;
///    ...
/// }
/// ```
/// expands into:
/// ```
/// use clap::Parser;
/// use lazy_static::lazy_static;
///
/// #[derive(Parser)]
/// #[command(about = "my silly prog")]
/// struct CliOpts {
///     #[arg(help = "run verbose", long)]
///     verbose: bool,
///
///     #[arg(help = "pathname of config", long, default_value = "blah")]
///     config: String,
///
///     #[arg(help = "input filename")]
///     input: String,
/// }
///
/// lazy_static! { static ref ARGS: CliOpts = CliOpts::parse(); }
/// ```
#[macro_export]
macro_rules! define_cli {
    ($name:ident [ $( $sopt:ident $(= $sx:expr)? ),* ] = $( $( #[$meta:meta] )? $fname:ident : $ftype:ty [ $( $fopt:ident $(= $fx:expr)?),* ] ),* ) => {
        use clap::Parser;
        use lazy_static::lazy_static;

        #[derive(Parser)]
        #[command( $( $sopt $(=$sx)? ),* )]
        struct CliOpts {
            $(
                #[arg( $( $fopt $(=$fx)? ),* )]
                $(#[$meta])?
                $fname : $ftype,
            )*
        }
        lazy_static! { static ref $name: CliOpts = CliOpts::parse(); }
    }
}

#[macro_export]
macro_rules! check_cli {
    ($sopt:ident) => { { let _force_parse = &*$sopt; } }
}

/// syntactic sugar macro to define thiserror Error enums:
/// ```
/// # use mcrop_common::define_error;
/// define_error!{ pub McropNetError =
///   IOError( #[from] std::io::Error ) : "IO error: {0}",
///   OpFailed(String) : "operation failed: {0}"
/// }
/// ```
/// will get expanded into
/// ```ignore
/// use thiserror;
/// pub enum McropNetError {
///     #[error("IO error: {0}")]
///     IOError(#[from] std::io::Error),
///
///     #[error("operation failed: {0}")]
///     OpFailed(String),
/// }
/// ```
#[macro_export]
macro_rules! define_error {
    ($vis:vis $name:ident = $( $err_variant:ident ( $( $( #[$meta:meta] )? $field_type:ty),* ) : $msg_lit:literal ),*) => {
        use thiserror;
        #[derive(thiserror::Error,Debug)]
        $vis enum $name {
            $(
                #[error($msg_lit)]
                $err_variant ( $( $(#[$meta])? $field_type ),*  )
            ),*
        }
    }
}

/* #endregion define_cli */
