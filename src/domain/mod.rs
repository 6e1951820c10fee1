pub mod payment;

pub use payment::{
    check_amount, is_terminal_status, CreateCustomerInput, EwalletPaymentInput, QrCodePaymentInput,
    VirtualAccountPaymentInput,
};
