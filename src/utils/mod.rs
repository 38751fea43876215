pub mod display;

pub use display::{
    print_diff, print_diff_summary, print_error, print_header, print_info, print_prompt,
    print_success,
};
